//! Account repository for `PostgreSQL`.
//!
//! Queries go through the runtime `sqlx::query_as` API into row types which are
//! then validated into domain types.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use accounts_core::{AccountId, Email, HashedPassword};

use super::{AccountStore, InsertAccount, RepositoryError, map_unique_violation};
use crate::models::Account;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` account queries.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: AccountId,
    email: String,
    full_name: Option<String>,
    password_hash: HashedPassword,
    active: bool,
    staff: bool,
    admin: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            full_name: row.full_name,
            password_hash: row.password_hash,
            active: row.active,
            staff: row.staff,
            admin: row.admin,
            last_login: row.last_login,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl AccountStore for AccountRepository<'_> {
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    async fn insert(&self, account: InsertAccount) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            INSERT INTO accounts.account (email, full_name, password_hash, active, staff, admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, full_name, password_hash, active, staff, admin,
                      last_login, created_at
            ",
        )
        .bind(&account.email)
        .bind(account.full_name.as_deref())
        .bind(&account.password_hash)
        .bind(account.active)
        .bind(account.staff)
        .bind(account.admin)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email already exists"))?;

        row.try_into()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    async fn set_active(&self, id: AccountId, active: bool) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            UPDATE accounts.account
            SET active = $2
            WHERE id = $1
            RETURNING id, email, full_name, password_hash, active, staff, admin,
                      last_login, created_at
            ",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    async fn grant_staff(&self, id: AccountId) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            UPDATE accounts.account
            SET staff = TRUE
            WHERE id = $1
            RETURNING id, email, full_name, password_hash, active, staff, admin,
                      last_login, created_at
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    async fn grant_admin(&self, id: AccountId) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            UPDATE accounts.account
            SET staff = TRUE, admin = TRUE
            WHERE id = $1
            RETURNING id, email, full_name, password_hash, active, staff, admin,
                      last_login, created_at
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    async fn set_password_hash(
        &self,
        id: AccountId,
        password_hash: &HashedPassword,
    ) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            UPDATE accounts.account
            SET password_hash = $2
            WHERE id = $1
            RETURNING id, email, full_name, password_hash, active, staff, admin,
                      last_login, created_at
            ",
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// The `active` check is part of the `UPDATE`, so a deactivation committed
    /// after the password was verified still blocks the login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    async fn record_login(
        &self,
        id: AccountId,
        at: DateTime<Utc>,
    ) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            UPDATE accounts.account
            SET last_login = $2
            WHERE id = $1 AND active
            RETURNING id, email, full_name, password_hash, active, staff, admin,
                      last_login, created_at
            ",
        )
        .bind(id)
        .bind(at)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            SELECT id, email, full_name, password_hash, active, staff, admin,
                   last_login, created_at
            FROM accounts.account
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    async fn get_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            SELECT id, email, full_name, password_hash, active, staff, admin,
                   last_login, created_at
            FROM accounts.account
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    async fn list_all(&self) -> Result<Vec<Account>, RepositoryError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r"
            SELECT id, email, full_name, password_hash, active, staff, admin,
                   last_login, created_at
            FROM accounts.account
            ORDER BY created_at ASC, id ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
