//! Guest email domain type.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use accounts_core::{Email, GuestEmailId};

/// An email captured from a visitor who has no account (e.g. guest checkout).
///
/// Not linked to [`Account`](super::Account) and not unique: the same address
/// may be captured any number of times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestEmail {
    /// Unique record ID.
    pub id: GuestEmailId,
    /// Captured email address (normalized).
    pub email: Email,
    /// Whether the address may still be used.
    pub active: bool,
    /// When the email was captured.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for GuestEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.email, f)
    }
}
