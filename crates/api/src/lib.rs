//! Bazaar API library.
//!
//! The HTTP backend for the Bazaar shop: catalog, checkout, addresses,
//! reviews, and the admin dashboard API. The binary in `main.rs` wires this
//! library to configuration, the database, and the network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Largest accepted request body (three product images plus fields).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the application router with its per-request layers.
///
/// Rate limiting and Sentry are added by the binary, which owns the
/// connection info and the Sentry client.
pub fn app(state: AppState) -> Router {
    let config = state.config();

    let mut router = routes::routes()
        .nest_service("/uploads", ServeDir::new(&config.upload_dir));

    // The admin dashboard is a client-side routed SPA
    if config.environment.is_production() {
        let index = config.admin_dist.join("index.html");
        router = router.fallback_service(
            ServeDir::new(&config.admin_dist).not_found_service(ServeFile::new(index)),
        );
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(&config.cors_origins))
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// CORS for the admin dashboard and the mobile app.
///
/// An empty origin list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_origins(origins))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}
