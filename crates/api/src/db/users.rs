//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{Email, UserId};

use super::RepositoryError;
use crate::models::{IdentityProfile, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    clerk_id: String,
    email: String,
    name: String,
    image_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            clerk_id: row.clerk_id,
            email,
            name: row.name,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, clerk_id, email, name, image_url, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their identity provider id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE clerk_id = $1"
        ))
        .bind(clerk_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Insert a user or refresh the profile of an existing one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, profile: &IdentityProfile) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO shop.user (id, clerk_id, email, name, image_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (clerk_id) DO UPDATE
               SET email = EXCLUDED.email,
                   name = EXCLUDED.name,
                   image_url = EXCLUDED.image_url,
                   updated_at = now()
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(UserId::generate())
        .bind(&profile.clerk_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.image_url)
        .fetch_one(self.pool)
        .await?;

        User::try_from(row)
    }

    /// Delete a user by identity provider id.
    ///
    /// Addresses and reviews go with the user; orders keep their snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_by_clerk_id(&self, clerk_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.user WHERE clerk_id = $1")
            .bind(clerk_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List every user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}
