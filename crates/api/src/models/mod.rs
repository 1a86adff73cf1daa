//! Domain models for the store.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. They serialize in the shape the admin dashboard and the
//! mobile app read: camelCase fields with the id under `_id`.

pub mod address;
pub mod order;
pub mod product;
pub mod review;
pub mod stats;
pub mod user;

pub use address::{Address, AddressInput};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderSummary, ShippingAddress, ValidatedOrder,
};
pub use product::{Product, ProductFields, ProductFormFields};
pub use review::{NewReview, Review};
pub use stats::DashboardStats;
pub use user::{IdentityProfile, User};

/// Input rejected before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Trim a required text field, rejecting blanks.
pub(crate) fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
