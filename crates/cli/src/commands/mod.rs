//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod stats;

use secrecy::SecretString;

/// Read the database URL from the environment, loading `.env` first.
///
/// # Errors
///
/// Returns an error if neither `BAZAAR_DATABASE_URL` nor `DATABASE_URL` is set.
pub fn database_url() -> Result<SecretString, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "BAZAAR_DATABASE_URL not set".into())
}
