//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness check
//! GET    /health/ready                    - Readiness check (database)
//!
//! # Products (reads public, writes admin)
//! GET    /api/products                    - Product listing
//! GET    /api/products/{id}               - Product detail
//! POST   /api/products                    - Create (multipart)
//! PUT    /api/products/{id}               - Update (multipart)
//! DELETE /api/products/{id}               - Delete
//!
//! # Shopper (bearer token)
//! GET    /api/orders                      - Own orders
//! POST   /api/orders                      - Place order
//! GET    /api/users/addresses             - Own addresses
//! POST   /api/users/addresses             - Add address
//! PUT    /api/users/addresses/{id}        - Replace address
//! DELETE /api/users/addresses/{id}        - Remove address
//! POST   /api/reviews                     - Review a delivered product
//! DELETE /api/reviews/{id}                - Remove own review
//!
//! # Admin (bearer token, admin email)
//! GET    /api/admin/products              - Product listing
//! POST   /api/admin/products              - Create (multipart)
//! PUT    /api/admin/products/{id}         - Update (multipart)
//! DELETE /api/admin/products/{id}         - Delete
//! GET    /api/admin/orders                - All orders
//! PATCH  /api/admin/orders/{id}/status    - Set order status
//! GET    /api/admin/customers             - All customers
//! GET    /api/admin/stats                 - Dashboard totals
//!
//! # Jobs (signed)
//! POST   /api/inngest                     - Identity provider events
//! ```

pub mod addresses;
pub mod admin;
pub mod inngest;
pub mod orders;
pub mod products;
pub mod reviews;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: serde::Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path extractor whose rejections use the API error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route(
            "/{id}",
            put(addresses::update).delete(addresses::delete),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin::products).post(products::create))
        .route(
            "/products/{id}",
            put(products::update).delete(products::delete),
        )
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/status", patch(admin::update_order_status))
        .route("/customers", get(admin::customers))
        .route("/stats", get(admin::stats))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/orders", get(orders::index).post(orders::create))
        .nest("/users/addresses", address_routes())
        .route("/reviews", post(reviews::create))
        .route("/reviews/{id}", delete(reviews::delete))
        .nest("/admin", admin_routes())
        .route("/inngest", post(inngest::receive))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
