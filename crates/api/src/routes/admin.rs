//! Admin dashboard route handlers.
//!
//! Product writes live in [`super::products`]; this module covers the
//! product listing, orders, customers, and dashboard statistics.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use bazaar_core::{OrderId, OrderStatus};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{DashboardStats, Product};
use crate::state::AppState;

use super::{ApiJson, ApiPath};

/// Body of a status update. The raw string is parsed before any storage
/// access so unknown values never reach the database.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// All products, newest first.
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    let products = state.services().products.list().await?;
    Ok(Json(products))
}

/// All orders, newest first.
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let orders = state.services().orders.list_all().await?;
    Ok(Json(json!({ "orders": orders })))
}

/// Set an order's status.
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<impl IntoResponse> {
    let status: OrderStatus = body
        .status
        .parse()
        .map_err(|e: bazaar_core::InvalidOrderStatus| AppError::BadRequest(e.to_string()))?;

    let order = state.services().orders.update_status(id, status).await?;
    Ok(Json(json!({ "order": order })))
}

/// All customers, newest first.
pub async fn customers(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let customers = state.services().users.customers().await?;
    Ok(Json(json!({ "customers": customers })))
}

/// Dashboard totals.
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardStats>> {
    let stats = state.services().users.dashboard_stats().await?;
    Ok(Json(stats))
}
