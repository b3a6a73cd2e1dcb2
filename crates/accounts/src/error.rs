//! Account error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during account and guest email operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// A field that must be non-empty at creation time was empty.
    #[error("{0} is required")]
    MissingRequiredField(&'static str),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] accounts_core::EmailError),

    /// Password shorter than the configured minimum.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Configured minimum length.
        min: usize,
    },

    /// Another account already uses this email.
    #[error("an account with email {0} already exists")]
    UniquenessViolation(String),

    /// Account or guest email not found.
    #[error("not found")]
    NotFound,

    /// Unknown email, wrong password, or inactive account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AccountError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}
