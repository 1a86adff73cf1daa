//! Bazaar Core - shared domain types.
//!
//! Used by:
//! - `api` - the REST backend consumed by the admin dashboard and mobile app
//! - `cli` - migrations, catalog seeding and reporting
//!
//! # Architecture
//!
//! The core crate contains only types and validation rules - no I/O, no
//! database access, no HTTP. Database encodings are behind the `postgres`
//! feature so the types stay usable anywhere.
//!
//! # Modules
//!
//! - [`types`] - ids, prices, emails, ratings, order statuses and image rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
