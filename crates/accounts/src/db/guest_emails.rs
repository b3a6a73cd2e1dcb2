//! Guest email repository for `PostgreSQL`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use accounts_core::{Email, GuestEmailId};

use super::{GuestEmailStore, RepositoryError};
use crate::models::GuestEmail;

/// Internal row type for `PostgreSQL` guest email queries.
#[derive(Debug, sqlx::FromRow)]
struct GuestEmailRow {
    id: GuestEmailId,
    email: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GuestEmailRow> for GuestEmail {
    type Error = RepositoryError;

    fn try_from(row: GuestEmailRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for guest email database operations.
pub struct GuestEmailRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GuestEmailRepository<'a> {
    /// Create a new guest email repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl GuestEmailStore for GuestEmailRepository<'_> {
    async fn insert(&self, email: &Email) -> Result<GuestEmail, RepositoryError> {
        let row = sqlx::query_as::<_, GuestEmailRow>(
            r"
            INSERT INTO accounts.guest_email (email)
            VALUES ($1)
            RETURNING id, email, active, created_at, updated_at
            ",
        )
        .bind(email)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    async fn set_active(
        &self,
        id: GuestEmailId,
        active: bool,
    ) -> Result<GuestEmail, RepositoryError> {
        let row = sqlx::query_as::<_, GuestEmailRow>(
            r"
            UPDATE accounts.guest_email
            SET active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, active, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn get_by_id(&self, id: GuestEmailId) -> Result<Option<GuestEmail>, RepositoryError> {
        let row = sqlx::query_as::<_, GuestEmailRow>(
            r"
            SELECT id, email, active, created_at, updated_at
            FROM accounts.guest_email
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_active(&self) -> Result<Vec<GuestEmail>, RepositoryError> {
        let rows = sqlx::query_as::<_, GuestEmailRow>(
            r"
            SELECT id, email, active, created_at, updated_at
            FROM accounts.guest_email
            WHERE active
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
