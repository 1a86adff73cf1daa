//! Domain value types for Bazaar.
//!
//! Each type validates on construction, so holding one means the value is
//! already acceptable to the store.

pub mod email;
pub mod id;
pub mod images;
pub mod price;
pub mod rating;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use images::{
    ImageCountError, MAX_PRODUCT_IMAGES, check_new_product_images, check_replacement_images,
};
pub use price::{Price, PriceError};
pub use rating::{Rating, RatingError};
pub use status::{InvalidOrderStatus, OrderStatus};
