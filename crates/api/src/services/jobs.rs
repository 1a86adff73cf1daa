//! Background job webhook.
//!
//! The event service delivers identity provider events as signed JSON
//! posts. The `x-inngest-signature` header has the form
//! `t=<unix seconds>&s=<hex hmac>`, where the HMAC-SHA256 covers the raw
//! body followed by the timestamp, keyed with the signing key minus its
//! `signkey-<env>-` prefix.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use bazaar_core::Email;

use crate::models::IdentityProfile;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-inngest-signature";

/// Oldest acceptable signature timestamp, in seconds.
pub const MAX_SIGNATURE_AGE_SECS: i64 = 5 * 60;

/// Errors that can occur while accepting a job event.
#[derive(Debug, Error)]
pub enum JobError {
    /// Signature header absent or not `t=..&s=..`.
    #[error("missing or malformed signature")]
    MalformedSignature,

    /// Signature did not match the body.
    #[error("signature mismatch")]
    BadSignature,

    /// Timestamp outside the accepted window.
    #[error("signature expired")]
    Expired,

    /// Body is not an event, or the event data is unusable.
    #[error("invalid event payload: {0}")]
    InvalidPayload(String),

    /// The configured signing key cannot key an HMAC.
    #[error("signing key rejected")]
    InvalidKey,
}

/// Check a webhook signature against the raw body.
///
/// # Errors
///
/// Returns `JobError` if the header is malformed, stale, or does not match.
pub fn verify_signature(
    signing_key: &SecretString,
    header: Option<&str>,
    body: &[u8],
    now_unix: i64,
) -> Result<(), JobError> {
    let header = header.ok_or(JobError::MalformedSignature)?;

    let mut timestamp = None;
    let mut signature = None;
    for part in header.split('&') {
        match part.split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("s", value)) => signature = Some(value),
            _ => {}
        }
    }
    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return Err(JobError::MalformedSignature);
    };

    let issued_at: i64 = timestamp
        .parse()
        .map_err(|_| JobError::MalformedSignature)?;
    if now_unix.abs_diff(issued_at) > MAX_SIGNATURE_AGE_SECS.unsigned_abs() {
        return Err(JobError::Expired);
    }

    let expected = hex::decode(signature).map_err(|_| JobError::MalformedSignature)?;
    let mut mac = mac_for(signing_key)?;
    mac.update(body);
    mac.update(timestamp.as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| JobError::BadSignature)
}

/// Produce a signature header value for `body`.
///
/// Used to exercise the webhook from tests.
///
/// # Errors
///
/// Returns `JobError::InvalidKey` if the key cannot be used for HMAC.
pub fn sign(signing_key: &SecretString, body: &[u8], now_unix: i64) -> Result<String, JobError> {
    let timestamp = now_unix.to_string();
    let mut mac = mac_for(signing_key)?;
    mac.update(body);
    mac.update(timestamp.as_bytes());
    Ok(format!(
        "t={timestamp}&s={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn mac_for(signing_key: &SecretString) -> Result<HmacSha256, JobError> {
    let key = strip_key_prefix(signing_key.expose_secret());
    let Ok(mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
        tracing::error!("Webhook signing key rejected by HMAC");
        return Err(JobError::InvalidKey);
    };
    Ok(mac)
}

fn strip_key_prefix(key: &str) -> &str {
    key.strip_prefix("signkey-")
        .and_then(|rest| rest.split_once('-'))
        .map_or(key, |(_, secret)| secret)
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    name: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ClerkEmailAddress {
    id: Option<String>,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    id: String,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
    primary_email_address_id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClerkDeleted {
    id: String,
}

/// A job event the API acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// An account was created at the identity provider.
    UserCreated(IdentityProfile),
    /// An account was deleted at the identity provider.
    UserDeleted { clerk_id: String },
    /// Any other event, acknowledged without action.
    Ignored { name: String },
}

impl JobEvent {
    /// Parse a webhook body.
    ///
    /// # Errors
    ///
    /// Returns `JobError::InvalidPayload` for malformed JSON or unusable event data.
    pub fn parse(body: &[u8]) -> Result<Self, JobError> {
        let raw: RawEvent =
            serde_json::from_slice(body).map_err(|e| JobError::InvalidPayload(e.to_string()))?;

        match raw.name.as_str() {
            "clerk/user.created" => {
                let user: ClerkUser = serde_json::from_value(raw.data)
                    .map_err(|e| JobError::InvalidPayload(e.to_string()))?;
                Ok(Self::UserCreated(profile_from(user)?))
            }
            "clerk/user.deleted" => {
                let deleted: ClerkDeleted = serde_json::from_value(raw.data)
                    .map_err(|e| JobError::InvalidPayload(e.to_string()))?;
                Ok(Self::UserDeleted {
                    clerk_id: deleted.id,
                })
            }
            _ => Ok(Self::Ignored { name: raw.name }),
        }
    }
}

fn profile_from(user: ClerkUser) -> Result<IdentityProfile, JobError> {
    let primary = user
        .email_addresses
        .iter()
        .find(|e| e.id.is_some() && e.id == user.primary_email_address_id)
        .or_else(|| user.email_addresses.first())
        .ok_or_else(|| JobError::InvalidPayload("user has no email address".to_owned()))?;
    let email = Email::parse(&primary.email_address)
        .map_err(|e| JobError::InvalidPayload(e.to_string()))?;

    let name = [user.first_name, user.last_name]
        .into_iter()
        .flatten()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(IdentityProfile {
        clerk_id: user.id,
        email,
        name,
        image_url: user.image_url.unwrap_or_default(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("signkey-test-8f1c2d9e0b7a4c6e5f3a1b2c3d4e5f60")
    }

    const NOW: i64 = 1_760_000_000;

    #[test]
    fn test_signed_body_verifies() {
        let body = br#"{"name":"clerk/user.deleted","data":{"id":"user_1"}}"#;
        let header = sign(&key(), body, NOW).unwrap();
        assert!(verify_signature(&key(), Some(&header), body, NOW + 10).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let header = sign(&key(), b"{\"name\":\"a\"}", NOW).unwrap();
        assert!(matches!(
            verify_signature(&key(), Some(&header), b"{\"name\":\"b\"}", NOW),
            Err(JobError::BadSignature)
        ));
    }

    #[test]
    fn test_other_key_rejected() {
        let body = b"{}";
        let other = SecretString::from("signkey-test-00000000000000000000000000000000");
        let header = sign(&other, body, NOW).unwrap();
        assert!(matches!(
            verify_signature(&key(), Some(&header), body, NOW),
            Err(JobError::BadSignature)
        ));
    }

    #[test]
    fn test_stale_signature_rejected() {
        let body = b"{}";
        let header = sign(&key(), body, NOW).unwrap();
        assert!(matches!(
            verify_signature(&key(), Some(&header), body, NOW + MAX_SIGNATURE_AGE_SECS + 1),
            Err(JobError::Expired)
        ));
    }

    #[test]
    fn test_malformed_headers_rejected() {
        for header in [None, Some("garbage"), Some("t=abc&s=00"), Some("t=1760000000")] {
            assert!(matches!(
                verify_signature(&key(), header, b"{}", NOW),
                Err(JobError::MalformedSignature)
            ));
        }
    }

    #[test]
    fn test_extreme_timestamps_expire_without_overflow() {
        for header in [
            "t=-9223372036854775808&s=00",
            "t=9223372036854775807&s=00",
        ] {
            assert!(matches!(
                verify_signature(&key(), Some(header), b"{}", NOW),
                Err(JobError::Expired)
            ));
        }
        assert!(matches!(
            verify_signature(&key(), Some("t=0&s=00"), b"{}", i64::MIN),
            Err(JobError::Expired)
        ));
    }

    #[test]
    fn test_key_prefix_stripped() {
        assert_eq!(strip_key_prefix("signkey-prod-abc123"), "abc123");
        assert_eq!(strip_key_prefix("rawkey"), "rawkey");
    }

    #[test]
    fn test_parse_user_created_prefers_primary_email() {
        let body = serde_json::json!({
            "name": "clerk/user.created",
            "data": {
                "id": "user_29w83sxmDNGwOuEthce5gg56FcC",
                "email_addresses": [
                    { "id": "idn_a", "email_address": "old@bazaar.test" },
                    { "id": "idn_b", "email_address": "New@Bazaar.test" }
                ],
                "primary_email_address_id": "idn_b",
                "first_name": "Ada",
                "last_name": null,
                "image_url": "https://img.clerk.com/ada.png"
            }
        });
        let event = JobEvent::parse(body.to_string().as_bytes()).unwrap();
        let JobEvent::UserCreated(profile) = event else {
            panic!("expected user created, got {event:?}");
        };
        assert_eq!(profile.clerk_id, "user_29w83sxmDNGwOuEthce5gg56FcC");
        assert_eq!(profile.email.as_str(), "new@bazaar.test");
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.image_url, "https://img.clerk.com/ada.png");
    }

    #[test]
    fn test_parse_user_created_without_email_fails() {
        let body = br#"{"name":"clerk/user.created","data":{"id":"user_1","email_addresses":[]}}"#;
        assert!(matches!(
            JobEvent::parse(body),
            Err(JobError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_parse_user_deleted() {
        let body = br#"{"name":"clerk/user.deleted","data":{"id":"user_1","deleted":true}}"#;
        assert_eq!(
            JobEvent::parse(body).unwrap(),
            JobEvent::UserDeleted {
                clerk_id: "user_1".into()
            }
        );
    }

    #[test]
    fn test_unknown_events_ignored() {
        let body = br#"{"name":"shop/order.placed","data":{}}"#;
        assert_eq!(
            JobEvent::parse(body).unwrap(),
            JobEvent::Ignored {
                name: "shop/order.placed".into()
            }
        );
    }
}
