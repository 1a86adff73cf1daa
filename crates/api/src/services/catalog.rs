//! Catalog service.

use async_trait::async_trait;
use sqlx::PgPool;

use bazaar_core::ProductId;

use super::{ServiceError, not_found};
use crate::db::ProductRepository;
use crate::models::{Product, ProductFields};

/// Result of a product update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub product: Product,
    /// Images no longer referenced by the product, to be removed from storage.
    pub replaced_images: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductService: Send + Sync {
    /// All products, newest first.
    async fn list(&self) -> Result<Vec<Product>, ServiceError>;

    /// A single product.
    async fn get(&self, id: ProductId) -> Result<Product, ServiceError>;

    /// Create a product. `fields` must be complete.
    async fn create(
        &self,
        fields: ProductFields,
        images: Vec<String>,
    ) -> Result<Product, ServiceError>;

    /// Update the given fields, replacing the images when `images` is set.
    async fn update(
        &self,
        id: ProductId,
        fields: ProductFields,
        images: Option<Vec<String>>,
    ) -> Result<ProductUpdate, ServiceError>;

    /// Delete a product and return it.
    async fn delete(&self, id: ProductId) -> Result<Product, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct PgProductService {
    pool: PgPool,
}

impl PgProductService {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductService for PgProductService {
    async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(ProductRepository::new(&self.pool).list().await?)
    }

    async fn get(&self, id: ProductId) -> Result<Product, ServiceError> {
        ProductRepository::new(&self.pool)
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }

    #[tracing::instrument(skip(self, fields, images), fields(image_count = images.len()))]
    async fn create(
        &self,
        fields: ProductFields,
        images: Vec<String>,
    ) -> Result<Product, ServiceError> {
        if !fields.is_complete() {
            return Err(ServiceError::Validation(
                "name, category, description, price and stock are required".to_owned(),
            ));
        }
        bazaar_core::check_new_product_images(images.len())
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let product = ProductRepository::new(&self.pool)
            .create(&fields, &images)
            .await?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self, fields, images), fields(product_id = %id))]
    async fn update(
        &self,
        id: ProductId,
        fields: ProductFields,
        images: Option<Vec<String>>,
    ) -> Result<ProductUpdate, ServiceError> {
        if let Some(images) = &images {
            bazaar_core::check_new_product_images(images.len())
                .map_err(|e| ServiceError::Validation(e.to_string()))?;
        }

        let (product, previous) = ProductRepository::new(&self.pool)
            .update(id, &fields, images.as_deref())
            .await
            .map_err(not_found("product"))?;

        let replaced_images = if images.is_some() {
            previous
                .into_iter()
                .filter(|url| !product.images.contains(url))
                .collect()
        } else {
            Vec::new()
        };

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(ProductUpdate {
            product,
            replaced_images,
        })
    }

    #[tracing::instrument(skip(self), fields(product_id = %id))]
    async fn delete(&self, id: ProductId) -> Result<Product, ServiceError> {
        let product = ProductRepository::new(&self.pool)
            .delete(id)
            .await
            .map_err(not_found("product"))?;

        tracing::info!(product_id = %product.id, "Product deleted");
        Ok(product)
    }
}
