//! Background job webhook.
//!
//! The job platform relays identity provider events here. Each request is
//! authenticated by an HMAC signature over the raw body before it is parsed.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap, response::IntoResponse};
use serde_json::json;

use crate::error::Result;
use crate::services::JobEvent;
use crate::services::jobs::{SIGNATURE_HEADER, verify_signature};
use crate::state::AppState;

/// Receive one event.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_signature(
        &state.config().inngest_signing_key,
        signature,
        &body,
        chrono::Utc::now().timestamp(),
    )?;

    let services = state.services();
    match JobEvent::parse(&body)? {
        JobEvent::UserCreated(profile) => {
            let clerk_id = profile.clerk_id.clone();
            services.users.upsert(profile).await?;
            services.auth.forget(&clerk_id).await;
        }
        JobEvent::UserDeleted { clerk_id } => {
            services.users.delete_by_clerk_id(clerk_id.clone()).await?;
            services.auth.forget(&clerk_id).await;
        }
        JobEvent::Ignored { name } => {
            tracing::debug!(event = %name, "Ignoring job event");
            return Ok(Json(json!({ "status": "ignored" })));
        }
    }

    Ok(Json(json!({ "status": "ok" })))
}
