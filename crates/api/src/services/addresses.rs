//! Address book service.
//!
//! All operations are scoped to the calling user; another user's address id
//! behaves exactly like an unknown one.

use async_trait::async_trait;
use sqlx::PgPool;

use bazaar_core::{AddressId, UserId};

use super::{ServiceError, not_found};
use crate::db::AddressRepository;
use crate::models::{Address, AddressInput};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressService: Send + Sync {
    /// The user's addresses.
    async fn list(&self, user_id: UserId) -> Result<Vec<Address>, ServiceError>;

    /// Add an address, returning the refreshed list.
    async fn create(
        &self,
        user_id: UserId,
        input: AddressInput,
    ) -> Result<Vec<Address>, ServiceError>;

    /// Replace one address, returning the refreshed list.
    async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: AddressInput,
    ) -> Result<Vec<Address>, ServiceError>;

    /// Remove one address, returning the refreshed list.
    async fn delete(&self, user_id: UserId, id: AddressId) -> Result<Vec<Address>, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct PgAddressService {
    pool: PgPool,
}

impl PgAddressService {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressService for PgAddressService {
    async fn list(&self, user_id: UserId) -> Result<Vec<Address>, ServiceError> {
        Ok(AddressRepository::new(&self.pool).list(user_id).await?)
    }

    #[tracing::instrument(skip(self, input), fields(user_id = %user_id))]
    async fn create(
        &self,
        user_id: UserId,
        input: AddressInput,
    ) -> Result<Vec<Address>, ServiceError> {
        let input = input.validate()?;
        Ok(AddressRepository::new(&self.pool)
            .create(user_id, &input)
            .await?)
    }

    #[tracing::instrument(skip(self, input), fields(user_id = %user_id, address_id = %id))]
    async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: AddressInput,
    ) -> Result<Vec<Address>, ServiceError> {
        let input = input.validate()?;
        AddressRepository::new(&self.pool)
            .update(user_id, id, &input)
            .await
            .map_err(not_found("address"))
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id, address_id = %id))]
    async fn delete(&self, user_id: UserId, id: AddressId) -> Result<Vec<Address>, ServiceError> {
        AddressRepository::new(&self.pool)
            .delete(user_id, id)
            .await
            .map_err(not_found("address"))
    }
}
