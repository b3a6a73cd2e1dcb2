//! CLI command implementations.
//!
//! # Environment Variables
//!
//! - `ACCOUNTS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ACCOUNTS_PASSWORD` - Password for `user create*` commands

pub mod guest;
pub mod migrate;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use accounts::db::{self, RepositoryError};
use accounts::{AccountError, AccountsConfig, ConfigError};

/// Environment variable the create commands read the password from.
pub const PASSWORD_ENV: &str = "ACCOUNTS_PASSWORD";

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration or other repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Account or guest email operation failed.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Output could not be serialized.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load configuration and open a connection pool.
async fn connect() -> Result<(AccountsConfig, PgPool), CommandError> {
    let config = AccountsConfig::from_env()?;

    tracing::info!("Connecting to accounts database...");
    let pool = db::create_pool(&config.database).await?;

    Ok((config, pool))
}

/// Read the account password from the environment.
///
/// An empty value is passed through so the account factory reports it.
fn password_from_env() -> Result<SecretString, CommandError> {
    std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar(PASSWORD_ENV))
}
