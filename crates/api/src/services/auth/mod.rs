//! Bearer token authentication.
//!
//! The identity provider issues RS256 session tokens whose `sub` is the
//! provider's user id. Tokens are verified locally against the configured
//! PEM public key, then mapped to a local account. Accounts are cached for
//! five minutes so most requests skip the database lookup.

mod error;

pub use error::IdentityError;

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use moka::future::Cache;
use serde::Deserialize;
use sqlx::PgPool;

use crate::config::ClerkConfig;
use crate::db::UserRepository;
use crate::models::User;

/// Resolves bearer tokens to local users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verify `token` and return the account it belongs to.
    async fn authenticate(&self, token: &str) -> Result<User, IdentityError>;

    /// Drop any cached account for `clerk_id`.
    async fn forget(&self, clerk_id: &str);
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Verifies session token signatures and standard claims.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from provider settings.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidKey` if the key is not an RSA public key in PEM form.
    pub fn new(config: &ClerkConfig) -> Result<Self, IdentityError> {
        let key = DecodingKey::from_rsa_pem(config.jwt_public_key.as_bytes())
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self { key, validation })
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidToken` if any check fails.
    pub fn subject(&self, token: &str) -> Result<String, IdentityError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims.sub)
    }
}

/// Production authenticator: local token verification plus a cached account lookup.
pub struct ClerkAuthenticator {
    verifier: TokenVerifier,
    pool: PgPool,
    cache: Cache<String, User>,
}

impl ClerkAuthenticator {
    /// Create an authenticator.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidKey` if the configured key cannot be loaded.
    pub fn new(pool: PgPool, config: &ClerkConfig) -> Result<Self, IdentityError> {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            verifier: TokenVerifier::new(config)?,
            pool,
            cache,
        })
    }
}

#[async_trait]
impl Authenticator for ClerkAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<User, IdentityError> {
        let clerk_id = self.verifier.subject(token)?;

        if let Some(user) = self.cache.get(&clerk_id).await {
            return Ok(user);
        }

        let user = UserRepository::new(&self.pool)
            .get_by_clerk_id(&clerk_id)
            .await?
            .ok_or(IdentityError::UnknownUser)?;

        self.cache.insert(clerk_id, user.clone()).await;
        Ok(user)
    }

    async fn forget(&self, clerk_id: &str) {
        self.cache.invalidate(clerk_id).await;
    }
}
