//! Saved address route handlers.
//!
//! Every response carries the caller's full address list as `{ addresses }`,
//! which is what the mobile client reads after each mutation.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use bazaar_core::AddressId;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{Address, AddressInput};
use crate::state::AppState;

use super::{ApiJson, ApiPath};

fn addresses(list: &[Address]) -> Json<serde_json::Value> {
    Json(json!({ "addresses": list }))
}

/// List the caller's addresses.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    let list = state.services().addresses.list(user.id).await?;
    Ok(addresses(&list))
}

/// Add an address.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<impl IntoResponse> {
    let list = state.services().addresses.create(user.id, input).await?;
    Ok((StatusCode::CREATED, addresses(&list)))
}

/// Replace one of the caller's addresses.
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<AddressId>,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<impl IntoResponse> {
    let list = state
        .services()
        .addresses
        .update(user.id, id, input)
        .await?;
    Ok(addresses(&list))
}

/// Remove one of the caller's addresses.
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<impl IntoResponse> {
    let list = state.services().addresses.delete(user.id, id).await?;
    Ok(addresses(&list))
}
