//! Account domain types.

use core::fmt;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;

use accounts_core::{AccountId, Email, HashedPassword};

use crate::password;

/// A user account, identified by its email address.
///
/// Accounts are only ever created through
/// [`AccountManager`](crate::services::AccountManager), which hashes the
/// password before anything is stored.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Login identifier (normalized, unique).
    pub email: Email,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Argon2id hash of the password.
    #[serde(skip)]
    pub password_hash: HashedPassword,
    /// Whether the account may authenticate.
    pub active: bool,
    /// Elevated operational access.
    pub staff: bool,
    /// Full administrative access. Expected to imply `staff`.
    pub admin: bool,
    /// Last successful authentication.
    pub last_login: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The full name if one is set, otherwise the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.as_str(),
        }
    }

    /// Short form of the name. Always the email.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.email.as_str()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.email, f)
    }
}

/// The identity contract an authentication layer needs from its user type.
pub trait Principal {
    /// The natural key used to look the principal up at login.
    fn identifier(&self) -> &Email;

    /// Whether the principal may log in at all.
    fn is_active(&self) -> bool;

    /// Whether the principal has elevated operational access.
    fn is_staff(&self) -> bool;

    /// Whether the principal has full administrative access.
    fn is_admin(&self) -> bool;

    /// Does the principal hold `permission`, optionally on a specific object?
    fn has_permission(&self, permission: &str, target: Option<&str>) -> bool;

    /// May the principal see anything in the module `module_label`?
    fn has_module_permission(&self, module_label: &str) -> bool;

    /// Verify a plaintext password against the stored credential.
    fn check_password(&self, password: &str) -> bool;
}

impl Principal for Account {
    fn identifier(&self) -> &Email {
        &self.email
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn is_staff(&self) -> bool {
        self.staff
    }

    fn is_admin(&self) -> bool {
        self.admin
    }

    /// Always `true`.
    ///
    /// There is no permission model behind this: every account, whatever its
    /// flags, is reported as holding every permission. Do not rely on it as an
    /// authorization boundary.
    fn has_permission(&self, _permission: &str, _target: Option<&str>) -> bool {
        true
    }

    /// Always `true`. Same caveat as [`Principal::has_permission`].
    fn has_module_permission(&self, _module_label: &str) -> bool {
        true
    }

    fn check_password(&self, password: &str) -> bool {
        password::verify_password(password, &self.password_hash).is_ok()
    }
}

/// Input for [`AccountManager::create_user`](crate::services::AccountManager::create_user).
///
/// Defaults match a regular account: active, not staff, not admin.
#[derive(Debug, Clone, Copy)]
pub struct NewAccount<'a> {
    /// Email as typed by the user; normalized before storage.
    pub email: &'a str,
    /// Plaintext password; hashed before storage.
    pub password: &'a SecretString,
    /// Optional display name.
    pub full_name: Option<&'a str>,
    /// Initial `active` flag.
    pub active: bool,
    /// Initial `staff` flag.
    pub staff: bool,
    /// Initial `admin` flag.
    pub admin: bool,
}

impl<'a> NewAccount<'a> {
    /// A regular, active account.
    #[must_use]
    pub const fn new(email: &'a str, password: &'a SecretString) -> Self {
        Self {
            email,
            password,
            full_name: None,
            active: true,
            staff: false,
            admin: false,
        }
    }

    /// Set the display name.
    #[must_use]
    pub const fn with_full_name(mut self, full_name: Option<&'a str>) -> Self {
        self.full_name = full_name;
        self
    }

    /// Set the `active` flag.
    #[must_use]
    pub const fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the `staff` flag.
    #[must_use]
    pub const fn staff(mut self, staff: bool) -> Self {
        self.staff = staff;
        self
    }

    /// Set the `admin` flag.
    #[must_use]
    pub const fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account(full_name: Option<&str>) -> Account {
        Account {
            id: AccountId::new(1),
            email: Email::parse("jane@example.com").unwrap(),
            full_name: full_name.map(str::to_owned),
            password_hash: password::hash_password("correct horse").unwrap(),
            active: true,
            staff: false,
            admin: false,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        assert_eq!(account(Some("Jane Doe")).display_name(), "Jane Doe");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(account(None).display_name(), "jane@example.com");
        assert_eq!(account(Some("")).display_name(), "jane@example.com");
        assert_eq!(account(Some("   ")).display_name(), "jane@example.com");
    }

    #[test]
    fn test_short_name_and_display_are_email() {
        let acct = account(Some("Jane Doe"));
        assert_eq!(acct.short_name(), "jane@example.com");
        assert_eq!(acct.to_string(), "jane@example.com");
    }

    #[test]
    fn test_permissions_always_granted() {
        let mut acct = account(None);
        for (active, staff, admin) in [
            (true, false, false),
            (false, false, false),
            (true, true, false),
            (true, true, true),
        ] {
            acct.active = active;
            acct.staff = staff;
            acct.admin = admin;
            assert!(acct.has_permission("orders.delete_order", None));
            assert!(acct.has_permission("", Some("order:42")));
            assert!(acct.has_module_permission("orders"));
            assert!(acct.has_module_permission(""));
        }
    }

    #[test]
    fn test_flag_projections() {
        let mut acct = account(None);
        acct.staff = true;
        assert!(acct.is_active());
        assert!(acct.is_staff());
        assert!(!acct.is_admin());
        assert_eq!(acct.identifier().as_str(), "jane@example.com");
    }

    #[test]
    fn test_check_password() {
        let acct = account(None);
        assert!(acct.check_password("correct horse"));
        assert!(!acct.check_password("wrong horse"));
        assert!(!acct.check_password(""));
    }

    #[test]
    fn test_serialized_account_omits_hash() {
        let json = serde_json::to_value(account(None)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "jane@example.com");
        assert_eq!(json["staff"], false);
    }

    #[test]
    fn test_new_account_defaults() {
        let password = SecretString::from("pw");
        let new = NewAccount::new("a@b.com", &password);
        assert!(new.active);
        assert!(!new.staff);
        assert!(!new.admin);
        assert!(new.full_name.is_none());

        let new = new.staff(true).admin(true).active(false);
        assert!(new.staff && new.admin && !new.active);
    }
}
