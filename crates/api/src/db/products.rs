//! Product repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use bazaar_core::{Price, ProductId};

use super::{RepositoryError, count_from_db, count_to_db};
use crate::models::{Product, ProductFields};

#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    name: String,
    category: String,
    description: String,
    price: Price,
    stock: i32,
    images: Vec<String>,
    average_rating: f64,
    total_reviews: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            category: row.category,
            description: row.description,
            price: row.price,
            stock: count_from_db("stock", row.stock)?,
            images: row.images,
            average_rating: row.average_rating,
            total_reviews: count_from_db("total_reviews", row.total_reviews)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(super) const PRODUCT_COLUMNS: &str = "id, name, category, description, price, stock, images, \
     average_rating, total_reviews, created_at, updated_at";

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if `fields` is incomplete.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        fields: &ProductFields,
        images: &[String],
    ) -> Result<Product, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, fields, images).await
    }

    /// Insert several products in one transaction; on any failure none are kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if any entry is incomplete.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create_all(
        &self,
        products: &[(ProductFields, Vec<String>)],
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut created = Vec::with_capacity(products.len());
        for (fields, images) in products {
            created.push(insert(&mut tx, fields, images).await?);
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Update the given fields, and the images when `images` is set.
    ///
    /// Returns the updated product and the images it had before.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ProductId,
        fields: &ProductFields,
        images: Option<&[String]>,
    ) -> Result<(Product, Vec<String>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous: Vec<String> =
            sqlx::query_scalar("SELECT images FROM shop.product WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let stock = fields
            .stock
            .map(|s| count_to_db("stock", s))
            .transpose()?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product
               SET name = COALESCE($2, name),
                   category = COALESCE($3, category),
                   description = COALESCE($4, description),
                   price = COALESCE($5, price),
                   stock = COALESCE($6, stock),
                   images = COALESCE($7, images),
                   updated_at = now()
             WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(fields.name.as_deref())
        .bind(fields.category.as_deref())
        .bind(fields.description.as_deref())
        .bind(fields.price)
        .bind(stock)
        .bind(images)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((Product::try_from(row)?, previous))
    }

    /// Delete a product, returning it so its images can be cleaned up.
    ///
    /// Order items keep their snapshots; reviews of the product are removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "DELETE FROM shop.product WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }
}

async fn insert(
    conn: &mut PgConnection,
    fields: &ProductFields,
    images: &[String],
) -> Result<Product, RepositoryError> {
    let (Some(name), Some(category), Some(description), Some(price), Some(stock)) = (
        &fields.name,
        &fields.category,
        &fields.description,
        fields.price,
        fields.stock,
    ) else {
        return Err(RepositoryError::DataCorruption(
            "product fields incomplete".to_owned(),
        ));
    };

    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r"
        INSERT INTO shop.product (id, name, category, description, price, stock, images)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {PRODUCT_COLUMNS}
        "
    ))
    .bind(ProductId::generate())
    .bind(name)
    .bind(category)
    .bind(description)
    .bind(price)
    .bind(count_to_db("stock", stock)?)
    .bind(images)
    .fetch_one(conn)
    .await?;

    Product::try_from(row)
}
