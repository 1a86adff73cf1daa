//! Business logic services.
//!
//! Each service is a trait with a `PostgreSQL` implementation. Route
//! handlers only see the traits (through [`crate::state::AppState`]), so
//! handler tests swap in mocks.
//!
//! # Services
//!
//! - `auth` - Bearer token verification and user lookup
//! - `catalog` - Product reads and admin product writes
//! - `orders` - Checkout, order history, status updates
//! - `addresses` - Saved shipping addresses
//! - `reviews` - Reviews and product rating aggregates
//! - `users` - Accounts mirrored from the identity provider, dashboard stats
//! - `jobs` - Signed background job webhook

pub mod addresses;
pub mod auth;
pub mod catalog;
pub mod jobs;
pub mod orders;
pub mod reviews;
pub mod users;

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::db::RepositoryError;
use crate::models::ValidationError;
use crate::storage::{ImageStore, LocalImageStore};

pub use addresses::{AddressService, PgAddressService};
pub use auth::{Authenticator, ClerkAuthenticator, IdentityError};
pub use catalog::{PgProductService, ProductService, ProductUpdate};
pub use jobs::{JobError, JobEvent};
pub use orders::{OrderService, PgOrderService};
pub use reviews::{PgReviewService, ReviewService};
pub use users::{PgUserService, UserService};

/// Errors returned by the domain services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The entity does not exist, or is not visible to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller may not act on this entity.
    #[error("{0}")]
    Forbidden(String),

    /// The request conflicts with current state (stock, duplicates).
    #[error("{0}")]
    Conflict(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.0)
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource"),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

/// Map a repository `NotFound` to a named entity.
pub(crate) fn not_found(entity: &'static str) -> impl FnOnce(RepositoryError) -> ServiceError {
    move |err| match err {
        RepositoryError::NotFound => ServiceError::NotFound(entity),
        other => other.into(),
    }
}

/// Every service the API routes depend on.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn Authenticator>,
    pub products: Arc<dyn ProductService>,
    pub orders: Arc<dyn OrderService>,
    pub addresses: Arc<dyn AddressService>,
    pub reviews: Arc<dyn ReviewService>,
    pub users: Arc<dyn UserService>,
    pub images: Arc<dyn ImageStore>,
}

impl Services {
    /// Build the `PostgreSQL` backed services.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidKey` if the configured public key is not a valid RSA PEM.
    pub fn postgres(pool: &PgPool, config: &ApiConfig) -> Result<Self, IdentityError> {
        Ok(Self {
            auth: Arc::new(ClerkAuthenticator::new(pool.clone(), &config.clerk)?),
            products: Arc::new(PgProductService::new(pool.clone())),
            orders: Arc::new(PgOrderService::new(pool.clone())),
            addresses: Arc::new(PgAddressService::new(pool.clone())),
            reviews: Arc::new(PgReviewService::new(pool.clone())),
            users: Arc::new(PgUserService::new(pool.clone())),
            images: Arc::new(LocalImageStore::new(
                config.upload_dir.clone(),
                format!("{}/uploads", config.public_url),
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_classify() {
        assert!(matches!(
            ServiceError::from(RepositoryError::NotFound),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::Conflict("dup".into())),
            ServiceError::Conflict(m) if m == "dup"
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::DataCorruption("bad".into())),
            ServiceError::Repository(_)
        ));
    }

    #[test]
    fn test_not_found_names_entity() {
        let err = not_found("order")(RepositoryError::NotFound);
        assert_eq!(err.to_string(), "order not found");
    }
}
