//! Accounts mirrored from the identity provider, and store-wide figures.

use async_trait::async_trait;
use sqlx::PgPool;

use super::ServiceError;
use crate::db::{StatsRepository, UserRepository};
use crate::models::{DashboardStats, IdentityProfile, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Every customer, newest first.
    async fn customers(&self) -> Result<Vec<User>, ServiceError>;

    /// Create or refresh a user from an identity provider profile.
    async fn upsert(&self, profile: IdentityProfile) -> Result<User, ServiceError>;

    /// Remove a user. Returns whether one existed.
    async fn delete_by_clerk_id(&self, clerk_id: String) -> Result<bool, ServiceError>;

    /// Totals for the admin dashboard.
    async fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct PgUserService {
    pool: PgPool,
}

impl PgUserService {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserService for PgUserService {
    async fn customers(&self) -> Result<Vec<User>, ServiceError> {
        Ok(UserRepository::new(&self.pool).list().await?)
    }

    #[tracing::instrument(skip(self, profile), fields(clerk_id = %profile.clerk_id))]
    async fn upsert(&self, profile: IdentityProfile) -> Result<User, ServiceError> {
        let user = UserRepository::new(&self.pool).upsert(&profile).await?;
        tracing::info!(user_id = %user.id, "User synced from identity provider");
        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_clerk_id(&self, clerk_id: String) -> Result<bool, ServiceError> {
        let deleted = UserRepository::new(&self.pool)
            .delete_by_clerk_id(&clerk_id)
            .await?;
        if deleted {
            tracing::info!("User deleted");
        } else {
            tracing::info!("Delete requested for unknown user");
        }
        Ok(deleted)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        Ok(StatsRepository::new(&self.pool).dashboard().await?)
    }
}
