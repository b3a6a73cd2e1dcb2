//! Account storage.
//!
//! # Database: `PostgreSQL`, schema `accounts`
//!
//! ## Tables
//!
//! - `account` - Email-keyed user accounts (unique `email`)
//! - `guest_email` - Emails captured from visitors without an account
//!
//! # Stores
//!
//! Services are generic over [`AccountStore`] and [`GuestEmailStore`]:
//!
//! - [`AccountRepository`] / [`GuestEmailRepository`] - `PostgreSQL`
//! - [`MemoryStore`] - in-process, for tests and local tooling
//!
//! # Migrations
//!
//! Migrations are stored in `crates/accounts/migrations/` and run via:
//! ```bash
//! cargo run -p accounts-cli -- migrate
//! ```

pub mod accounts;
pub mod guest_emails;
pub mod memory;

use std::future::Future;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use accounts_core::{AccountId, Email, GuestEmailId, HashedPassword};

use crate::config::DatabaseConfig;
use crate::models::{Account, GuestEmail};

pub use accounts::AccountRepository;
pub use guest_emails::GuestEmailRepository;
pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error from sqlx.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// A fully validated account ready to be inserted.
#[derive(Debug, Clone)]
pub struct InsertAccount {
    /// Normalized email.
    pub email: Email,
    /// Display name, `None` when blank.
    pub full_name: Option<String>,
    /// Hashed password.
    pub password_hash: HashedPassword,
    /// Initial `active` flag.
    pub active: bool,
    /// Initial `staff` flag.
    pub staff: bool,
    /// Initial `admin` flag.
    pub admin: bool,
}

/// Persistence for [`Account`] records.
///
/// Implementations must reject a second account with the same email with
/// [`RepositoryError::Conflict`], including under concurrent inserts.
///
/// Updates write only the columns they name, so concurrent changes to other
/// columns of the same account are never overwritten.
pub trait AccountStore: Send + Sync {
    /// Insert a new account and return it with its ID and creation time.
    fn insert(
        &self,
        account: InsertAccount,
    ) -> impl Future<Output = Result<Account, RepositoryError>> + Send;

    /// Set the `active` flag and return the updated account.
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    fn set_active(
        &self,
        id: AccountId,
        active: bool,
    ) -> impl Future<Output = Result<Account, RepositoryError>> + Send;

    /// Set `staff` and return the updated account.
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    fn grant_staff(
        &self,
        id: AccountId,
    ) -> impl Future<Output = Result<Account, RepositoryError>> + Send;

    /// Set both `staff` and `admin` and return the updated account.
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    fn grant_admin(
        &self,
        id: AccountId,
    ) -> impl Future<Output = Result<Account, RepositoryError>> + Send;

    /// Replace the password hash and return the updated account.
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    fn set_password_hash(
        &self,
        id: AccountId,
        password_hash: &HashedPassword,
    ) -> impl Future<Output = Result<Account, RepositoryError>> + Send;

    /// Set `last_login` if the account is still active at write time.
    ///
    /// Returns `None` when the account is unknown or inactive; nothing is
    /// written in that case.
    fn record_login(
        &self,
        id: AccountId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Get an account by ID.
    fn get_by_id(
        &self,
        id: AccountId,
    ) -> impl Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Get an account by its (normalized) email.
    fn get_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// List every account, oldest first.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Account>, RepositoryError>> + Send;
}

/// Persistence for [`GuestEmail`] records.
pub trait GuestEmailStore: Send + Sync {
    /// Insert a new, active guest email.
    fn insert(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<GuestEmail, RepositoryError>> + Send;

    /// Set the `active` flag and refresh `updated_at`.
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    fn set_active(
        &self,
        id: GuestEmailId,
        active: bool,
    ) -> impl Future<Output = Result<GuestEmail, RepositoryError>> + Send;

    /// Get a guest email by ID.
    fn get_by_id(
        &self,
        id: GuestEmailId,
    ) -> impl Future<Output = Result<Option<GuestEmail>, RepositoryError>> + Send;

    /// List active guest emails, newest first.
    fn list_active(&self) -> impl Future<Output = Result<Vec<GuestEmail>, RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool from the database settings.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(database.max_connections)
        .min_connections(1)
        .acquire_timeout(database.acquire_timeout)
        .connect(database.url.expose_secret())
        .await
}

/// Run the embedded migrations against `pool`.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Map an insert error, turning a unique violation into `Conflict`.
fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(e)
}
