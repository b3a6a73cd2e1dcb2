//! Accounts configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ACCOUNTS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `ACCOUNTS_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `ACCOUNTS_DB_ACQUIRE_TIMEOUT_SECS` - Pool acquire timeout (default: 10)
//! - `ACCOUNTS_MIN_PASSWORD_LENGTH` - Minimum password length on create (default: 0, any non-empty password)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Accounts configuration.
#[derive(Debug, Clone)]
pub struct AccountsConfig {
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Minimum password length enforced by the account factory
    pub min_password_length: usize,
}

/// `PostgreSQL` pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL (contains password)
    pub url: SecretString,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// How long to wait for a free connection
    pub acquire_timeout: Duration,
}

impl AccountsConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database: DatabaseConfig::from_env()?,
            min_password_length: parse_env_or_default("ACCOUNTS_MIN_PASSWORD_LENGTH", 0)?,
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let acquire_secs = parse_env_or_default("ACCOUNTS_DB_ACQUIRE_TIMEOUT_SECS", 10)?;

        Ok(Self {
            url: get_database_url("ACCOUNTS_DATABASE_URL")?,
            max_connections: parse_env_or_default("ACCOUNTS_DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout: Duration::from_secs(acquire_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Parse an environment variable, using `default` when it is unset.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
