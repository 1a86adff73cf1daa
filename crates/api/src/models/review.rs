//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{OrderId, ProductId, Rating, ReviewId, UserId};

/// A review left by a shopper for a delivered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Review submission. The rating is range checked while deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
}
