//! Email address type.
//!
//! Accounts are keyed by email, so every address that reaches storage goes
//! through [`Email::normalized`] first.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain an @ symbol.
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain part (after @) is empty.
    #[error("email domain cannot be empty")]
    EmptyDomain,
}

/// Normalize an email address.
///
/// Surrounding whitespace is trimmed and the domain portion (after the last
/// `@`) is lower-cased. The local part is left as typed, since mailbox names
/// may be case-sensitive. Input without an `@` is returned trimmed.
///
/// Normalization is idempotent.
///
/// ```
/// use accounts_core::normalize_email;
///
/// assert_eq!(normalize_email(" Jane.Doe@Example.COM "), "Jane.Doe@example.com");
/// assert_eq!(
///     normalize_email(&normalize_email("Jane.Doe@Example.COM")),
///     normalize_email("Jane.Doe@Example.COM"),
/// );
/// ```
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => trimmed.to_owned(),
    }
}

/// An email address.
///
/// This type provides basic validation for email addresses, ensuring they
/// have a valid structure with a local part and domain separated by an @ symbol.
///
/// ## Constraints
///
/// - Length: 1-255 characters (the account column width)
/// - The last @ symbol separates local part and domain
/// - Local part (before @) must not be empty
/// - Domain part (after @) must not be empty
///
/// ## Examples
///
/// ```
/// use accounts_core::Email;
///
/// // Valid emails
/// assert!(Email::parse("user@example.com").is_ok());
/// assert!(Email::parse("user.name+tag@domain.co.uk").is_ok());
///
/// // Invalid emails
/// assert!(Email::parse("").is_err());           // empty
/// assert!(Email::parse("no-at-symbol").is_err()); // missing @
/// assert!(Email::parse("@domain.com").is_err());  // empty local part
/// assert!(Email::parse("user@").is_err());        // empty domain
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address, in characters.
    pub const MAX_LENGTH: usize = 255;

    /// Parse an `Email` from a string, exactly as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is longer than 255 characters
    /// - Does not contain an @ symbol
    /// - Has an empty local part or domain
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.rsplit_once('@').ok_or(EmailError::MissingAtSymbol)?;

        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }

        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Normalize then parse an `Email`.
    ///
    /// This is the form every account and guest email is stored in.
    ///
    /// # Errors
    ///
    /// Same as [`Email::parse`], applied to the normalized input.
    pub fn normalized(s: &str) -> Result<Self, EmailError> {
        Self::parse(&normalize_email(s))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the local part of the email (before the last @).
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(local, _)| local)
    }

    /// Returns the domain part of the email (after the last @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user.name@example.com").is_ok());
        assert!(Email::parse("user+tag@example.com").is_ok());
        assert!(Email::parse("user@subdomain.example.com").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_length_bound() {
        let at_limit = format!("{}@example.com", "a".repeat(255 - "@example.com".len()));
        assert!(Email::parse(&at_limit).is_ok());

        let over = format!("a{at_limit}");
        assert_eq!(
            Email::parse(&over),
            Err(EmailError::TooLong { max: 255 })
        );
    }

    #[test]
    fn test_parse_missing_at() {
        assert_eq!(Email::parse("no-at-symbol"), Err(EmailError::MissingAtSymbol));
    }

    #[test]
    fn test_parse_empty_parts() {
        assert_eq!(Email::parse("@domain.com"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("user@"), Err(EmailError::EmptyDomain));
    }

    #[test]
    fn test_local_part_and_domain() {
        let email = Email::parse("first@last@example.com").unwrap();
        assert_eq!(email.local_part(), "first@last");
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_normalize_lowercases_domain_only() {
        assert_eq!(normalize_email("John@EXAMPLE.Com"), "John@example.com");
        assert_eq!(normalize_email("  a@B.c\n"), "a@b.c");
        assert_eq!(normalize_email("no-at"), "no-at");
        assert_eq!(normalize_email(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "John@EXAMPLE.Com",
            " mixed.Case+Tag@Sub.Domain.ORG ",
            "weird@@Domain.COM",
            "no-at-symbol",
            "",
        ] {
            let once = normalize_email(raw);
            assert_eq!(normalize_email(&once), once, "input: {raw:?}");
        }
    }

    #[test]
    fn test_normalized_constructor() {
        let email = Email::normalized(" User@Example.COM").unwrap();
        assert_eq!(email.as_str(), "User@example.com");
        assert_eq!(Email::normalized("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_display() {
        let email = Email::parse("user@example.com").unwrap();
        assert_eq!(format!("{email}"), "user@example.com");
    }

    #[test]
    fn test_serde_transparent() {
        let email = Email::parse("user@example.com").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"user@example.com\"");
    }

    #[test]
    fn test_from_str() {
        let email: Email = "user@example.com".parse().unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }
}
