//! Address repository for database operations.
//!
//! Every mutation returns the owner's refreshed address list, which is what
//! the mobile app renders after saving.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use bazaar_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput};

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    label: String,
    full_name: String,
    street_address: String,
    city: String,
    state: String,
    zip_code: String,
    phone_number: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            label: row.label,
            full_name: row.full_name,
            street_address: row.street_address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            phone_number: row.phone_number,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        list_for(&mut conn, user_id).await
    }

    /// Add an address for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            clear_default(&mut tx, user_id, None).await?;
        }

        sqlx::query(
            r"
            INSERT INTO shop.address
                (id, user_id, label, full_name, street_address, city, state, zip_code,
                 phone_number, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(AddressId::generate())
        .bind(user_id)
        .bind(&input.label)
        .bind(&input.full_name)
        .bind(&input.street_address)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip_code)
        .bind(&input.phone_number)
        .bind(input.is_default)
        .execute(&mut *tx)
        .await?;

        let addresses = list_for(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(addresses)
    }

    /// Replace the fields of one of the user's addresses.
    ///
    /// Sibling addresses are untouched, except that setting `is_default`
    /// clears the flag on the others.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            clear_default(&mut tx, user_id, Some(id)).await?;
        }

        let result = sqlx::query(
            r"
            UPDATE shop.address
               SET label = $3,
                   full_name = $4,
                   street_address = $5,
                   city = $6,
                   state = $7,
                   zip_code = $8,
                   phone_number = $9,
                   is_default = $10,
                   updated_at = now()
             WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.label)
        .bind(&input.full_name)
        .bind(&input.street_address)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip_code)
        .bind(&input.phone_number)
        .bind(input.is_default)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let addresses = list_for(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(addresses)
    }

    /// Delete one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM shop.address WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let addresses = list_for(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(addresses)
    }
}

async fn list_for(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<Address>, RepositoryError> {
    let rows = sqlx::query_as::<_, AddressRow>(
        r"
        SELECT id, user_id, label, full_name, street_address, city, state, zip_code,
               phone_number, is_default, created_at, updated_at
          FROM shop.address
         WHERE user_id = $1
         ORDER BY created_at, id
        ",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(Address::from).collect())
}

/// Clear the user's default flag, holding the user row until commit so
/// concurrent default writers for the same user run one after another.
async fn clear_default(
    conn: &mut PgConnection,
    user_id: UserId,
    except: Option<AddressId>,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT 1 FROM shop.user WHERE id = $1 FOR NO KEY UPDATE")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r"
        UPDATE shop.address
           SET is_default = FALSE, updated_at = now()
         WHERE user_id = $1 AND is_default AND ($2::uuid IS NULL OR id <> $2)
        ",
    )
    .bind(user_id)
    .bind(except)
    .execute(conn)
    .await?;
    Ok(())
}
