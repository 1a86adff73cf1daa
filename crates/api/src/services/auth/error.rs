//! Identity error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur while identifying the caller.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No `Authorization: Bearer` header.
    #[error("missing bearer token")]
    MissingToken,

    /// Signature, expiry, or claims check failed.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The token is valid but no local account exists for its subject.
    #[error("user not found")]
    UnknownUser,

    /// The configured verification key could not be loaded.
    #[error("invalid verification key: {0}")]
    InvalidKey(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
