//! Review service.

use async_trait::async_trait;
use sqlx::PgPool;

use bazaar_core::ReviewId;

use super::{ServiceError, not_found};
use crate::db::{OrderRepository, ReviewRepository};
use crate::models::{NewReview, Order, Review, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Review a product from one of the user's delivered orders.
    async fn create(&self, user: User, review: NewReview) -> Result<Review, ServiceError>;

    /// Delete one of the user's reviews.
    async fn delete(&self, user: User, id: ReviewId) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct PgReviewService {
    pool: PgPool,
}

impl PgReviewService {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Check that `user` may review `review.product_id` through `order`.
pub(crate) fn check_eligible(
    user: &User,
    order: &Order,
    review: &NewReview,
) -> Result<(), ServiceError> {
    if order.user != Some(user.id) {
        return Err(ServiceError::Forbidden(
            "not authorized to review this order".to_owned(),
        ));
    }
    if !order.status.allows_review() {
        return Err(ServiceError::Validation(
            "can only review delivered orders".to_owned(),
        ));
    }
    if !order.product_ids().any(|id| id == review.product_id) {
        return Err(ServiceError::Validation(
            "product is not part of this order".to_owned(),
        ));
    }
    Ok(())
}

#[async_trait]
impl ReviewService for PgReviewService {
    #[tracing::instrument(
        skip(self, user, review),
        fields(user_id = %user.id, product_id = %review.product_id)
    )]
    async fn create(&self, user: User, review: NewReview) -> Result<Review, ServiceError> {
        let order = OrderRepository::new(&self.pool)
            .get_by_id(review.order_id)
            .await?
            .ok_or(ServiceError::NotFound("order"))?;

        check_eligible(&user, &order, &review)?;

        let created = ReviewRepository::new(&self.pool)
            .create(user.id, &review)
            .await?;

        tracing::info!(review_id = %created.id, rating = %created.rating, "Review created");
        Ok(created)
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.id, review_id = %id))]
    async fn delete(&self, user: User, id: ReviewId) -> Result<(), ServiceError> {
        let reviews = ReviewRepository::new(&self.pool);
        let review = reviews
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("review"))?;

        if review.user_id != user.id {
            return Err(ServiceError::Forbidden(
                "not authorized to delete this review".to_owned(),
            ));
        }

        reviews.delete(id).await.map_err(not_found("review"))?;
        tracing::info!("Review deleted");
        Ok(())
    }
}
