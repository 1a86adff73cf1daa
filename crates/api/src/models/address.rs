//! Saved shipping addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{AddressId, UserId};

use super::{ValidationError, required};

/// A saved address (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: AddressId,
    #[serde(skip)]
    pub user_id: UserId,
    pub label: String,
    pub full_name: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone_number: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Address fields as submitted by a client.
///
/// Every text field is required; missing fields deserialize as empty and are
/// rejected by [`AddressInput::validate`] so the client gets one clear message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressInput {
    pub label: String,
    pub full_name: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone_number: String,
    pub is_default: bool,
}

impl AddressInput {
    /// Trim every field and reject blanks.
    ///
    /// # Errors
    ///
    /// Returns the first blank field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            label: required("label", &self.label)?,
            full_name: required("fullName", &self.full_name)?,
            street_address: required("streetAddress", &self.street_address)?,
            city: required("city", &self.city)?,
            state: required("state", &self.state)?,
            zip_code: required("zipCode", &self.zip_code)?,
            phone_number: required("phoneNumber", &self.phone_number)?,
            is_default: self.is_default,
        })
    }
}
