//! Product image count rules.
//!
//! Both the admin dashboard and the API enforce these, so a product never
//! ends up with more than [`MAX_PRODUCT_IMAGES`] images or, once created,
//! with none.

/// Most images a product may carry.
pub const MAX_PRODUCT_IMAGES: usize = 3;

/// Violations of the image count rules.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCountError {
    /// A new product was submitted without images.
    #[error("at least one image is required")]
    Missing,
    /// More images than a product may carry.
    #[error("maximum {max} images allowed, got {got}", max = MAX_PRODUCT_IMAGES)]
    TooMany {
        /// Number of images submitted.
        got: usize,
    },
}

/// Check the image count of a product being created.
///
/// # Errors
///
/// Returns an error for zero images or more than [`MAX_PRODUCT_IMAGES`].
pub const fn check_new_product_images(count: usize) -> Result<(), ImageCountError> {
    if count == 0 {
        return Err(ImageCountError::Missing);
    }
    check_replacement_images(count)
}

/// Check the image count of an update.
///
/// Zero means "keep the current images" and is accepted.
///
/// # Errors
///
/// Returns an error for more than [`MAX_PRODUCT_IMAGES`].
pub const fn check_replacement_images(count: usize) -> Result<(), ImageCountError> {
    if count > MAX_PRODUCT_IMAGES {
        return Err(ImageCountError::TooMany { got: count });
    }
    Ok(())
}
