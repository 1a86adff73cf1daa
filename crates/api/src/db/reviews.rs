//! Review repository for database operations.
//!
//! Inserting or deleting a review recomputes the product's
//! `average_rating` and `total_reviews` in the same transaction.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use bazaar_core::{OrderId, ProductId, Rating, ReviewId, UserId};

use super::RepositoryError;
use crate::models::{NewReview, Review};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    user_id: UserId,
    order_id: OrderId,
    rating: Rating,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            order_id: row.order_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

const REVIEW_COLUMNS: &str = "id, product_id, user_id, order_id, rating, comment, created_at";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a review by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM shop.review WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Review::from))
    }

    /// Products the user has reviewed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reviewed_products(
        &self,
        user_id: UserId,
    ) -> Result<HashSet<ProductId>, RepositoryError> {
        let ids: Vec<ProductId> =
            sqlx::query_scalar("SELECT product_id FROM shop.review WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(self.pool)
                .await?;

        Ok(ids.into_iter().collect())
    }

    /// Insert a review and refresh the product's rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the product.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        review: &NewReview,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_product(&mut tx, review.product_id).await?;

        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            r"
            INSERT INTO shop.review (id, product_id, user_id, order_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {REVIEW_COLUMNS}
            "
        ))
        .bind(ReviewId::generate())
        .bind(review.product_id)
        .bind(user_id)
        .bind(review.order_id)
        .bind(review.rating)
        .bind(review.comment.trim())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, "product already reviewed"))?;

        refresh_rating(&mut tx, review.product_id).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    /// Delete a review and refresh the product's rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_id: ProductId =
            sqlx::query_scalar("SELECT product_id FROM shop.review WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;
        lock_product(&mut tx, product_id).await?;

        let deleted = sqlx::query("DELETE FROM shop.review WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        refresh_rating(&mut tx, product_id).await?;
        tx.commit().await?;

        Ok(())
    }
}

/// Serialize rating writers for one product.
///
/// Held until commit, so the recompute in `refresh_rating` starts after every
/// earlier writer's review is visible.
async fn lock_product(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT 1 FROM shop.product WHERE id = $1 FOR UPDATE")
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn refresh_rating(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.product p
           SET average_rating = COALESCE(r.average, 0),
               total_reviews = r.total,
               updated_at = now()
          FROM (
              SELECT AVG(rating)::DOUBLE PRECISION AS average, COUNT(*)::INTEGER AS total
                FROM shop.review
               WHERE product_id = $1
          ) r
         WHERE p.id = $1
        ",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
}
