//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error body is `{"error": "<message>"}`; server-side failures get a
//! generic message so database details never reach clients.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::{IdentityError, JobError, ServiceError};
use crate::storage::StorageError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Domain service failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Caller could not be identified.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Image storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Background job webhook rejected.
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Authenticated, but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body exceeded the configured limit.
    #[error("Payload too large")]
    PayloadTooLarge,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => match err {
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                ServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Identity(err) => match err {
                IdentityError::MissingToken
                | IdentityError::InvalidToken(_)
                | IdentityError::UnknownUser => StatusCode::UNAUTHORIZED,
                IdentityError::InvalidKey(_) | IdentityError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Storage(err) => match err {
                StorageError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
                StorageError::ForeignUrl(_) | StorageError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Job(err) => match err {
                JobError::MalformedSignature | JobError::BadSignature | JobError::Expired => {
                    StatusCode::UNAUTHORIZED
                }
                JobError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
                JobError::InvalidKey => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            _ if self.status().is_server_error() => "Internal server error".to_string(),
            Self::Service(err) => err.to_string(),
            Self::Identity(err) => match err {
                IdentityError::MissingToken => "Unauthorized - no token provided".to_string(),
                IdentityError::UnknownUser => "Unauthorized - user not found".to_string(),
                _ => "Unauthorized - invalid token".to_string(),
            },
            Self::Storage(err) => err.to_string(),
            Self::Job(JobError::InvalidPayload(message)) => message.clone(),
            Self::Job(_) => "Invalid signature".to_string(),
            Self::Forbidden(message) | Self::BadRequest(message) => message.clone(),
            Self::PayloadTooLarge => "Request body too large".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::BadRequest(rejection.body_text())
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
