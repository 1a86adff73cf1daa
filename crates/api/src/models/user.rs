//! Shopper accounts mirrored from the identity provider.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Email, UserId};

/// A shopper (domain type).
///
/// Accounts are created and removed by identity provider events; the API
/// never registers users itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Identity provider user id (the token `sub`).
    pub clerk_id: String,
    pub email: Email,
    pub name: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile data carried by an identity provider event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub clerk_id: String,
    pub email: Email,
    pub name: String,
    pub image_url: String,
}
