//! Shopper order route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::NewOrder;
use crate::state::AppState;

use super::ApiJson;

/// Place an order from the caller's cart.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(order): ApiJson<NewOrder>,
) -> Result<impl IntoResponse> {
    let order = state.services().orders.place(user, order).await?;
    Ok((StatusCode::CREATED, Json(json!({ "order": order }))))
}

/// The caller's orders, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    let orders = state.services().orders.list_for_user(user).await?;
    Ok(Json(json!({ "orders": orders })))
}
