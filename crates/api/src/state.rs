//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::{IdentityError, Services};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    services: Services,
}

impl AppState {
    /// Create a new application state backed by `PostgreSQL` services.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity provider's public key is invalid.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, IdentityError> {
        let services = Services::postgres(&pool, &config)?;
        Ok(Self::with_services(config, pool, services))
    }

    /// Create application state around an explicit set of services.
    #[must_use]
    pub fn with_services(config: ApiConfig, pool: PgPool, services: Services) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                services,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the domain services.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.inner.services
    }
}
