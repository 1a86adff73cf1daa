//! Review route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use bazaar_core::ReviewId;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::NewReview;
use crate::state::AppState;

use super::{ApiJson, ApiPath};

/// Review a product from a delivered order.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(review): ApiJson<NewReview>,
) -> Result<impl IntoResponse> {
    let review = state.services().reviews.create(user, review).await?;
    Ok((StatusCode::CREATED, Json(json!({ "review": review }))))
}

/// Delete one of the caller's reviews.
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<impl IntoResponse> {
    state.services().reviews.delete(user, id).await?;
    Ok(Json(json!({ "message": "Review deleted successfully" })))
}
