//! Account factory and account lifecycle operations.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use accounts_core::{AccountId, Email};

use crate::db::{AccountStore, InsertAccount, RepositoryError};
use crate::error::AccountError;
use crate::models::{Account, NewAccount};
use crate::password;

/// Builds accounts and applies flag, password and login changes to them.
///
/// The manager holds no state of its own beyond the store and the password
/// policy; every operation is a single validate-then-persist step and nothing
/// is written when validation fails.
#[derive(Debug, Clone)]
pub struct AccountManager<S> {
    store: S,
    min_password_length: usize,
}

impl<S: AccountStore> AccountManager<S> {
    /// Create a manager over `store`. Any non-empty password is accepted.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            min_password_length: 0,
        }
    }

    /// Require passwords of at least `min` characters on create and change.
    #[must_use]
    pub fn with_min_password_length(mut self, min: usize) -> Self {
        self.min_password_length = min;
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Factory
    // =========================================================================

    /// Create and persist an account.
    ///
    /// The email is normalized and the password hashed before the insert.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::MissingRequiredField` if the email or password is empty.
    /// Returns `AccountError::InvalidEmail` if the email is malformed.
    /// Returns `AccountError::PasswordTooShort` if a minimum length is configured and not met.
    /// Returns `AccountError::UniquenessViolation` if the email is already taken.
    #[instrument(skip(self, new), fields(email = %new.email))]
    pub async fn create_user(&self, new: NewAccount<'_>) -> Result<Account, AccountError> {
        if new.email.trim().is_empty() {
            return Err(AccountError::MissingRequiredField("email"));
        }
        let plaintext = new.password.expose_secret();
        self.validate_password(plaintext)?;

        let email = Email::normalized(new.email)?;
        let full_name = new
            .full_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        let password_hash = password::hash_password(plaintext)?;

        let account = self
            .store
            .insert(InsertAccount {
                email: email.clone(),
                full_name,
                password_hash,
                active: new.active,
                staff: new.staff,
                admin: new.admin,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AccountError::UniquenessViolation(email.into_inner()),
                other => other.into(),
            })?;

        tracing::info!(
            account_id = %account.id,
            active = account.active,
            staff = account.staff,
            admin = account.admin,
            "Account created"
        );
        Ok(account)
    }

    /// Create a regular account, then mark it staff.
    ///
    /// The flag is persisted in a second write. If that write fails the error
    /// is returned, but the account from the first write remains stored as a
    /// regular account; retry with [`AccountManager::promote_to_staff`].
    ///
    /// # Errors
    ///
    /// Same as [`AccountManager::create_user`], plus repository errors from the
    /// second write.
    pub async fn create_staff_user(
        &self,
        email: &str,
        password: &SecretString,
        full_name: Option<&str>,
    ) -> Result<Account, AccountError> {
        let created = self
            .create_user(NewAccount::new(email, password).with_full_name(full_name))
            .await?;

        let account = self.store.grant_staff(created.id).await?;

        tracing::info!(account_id = %account.id, "Staff account created");
        Ok(account)
    }

    /// Create a regular account, then mark it staff and admin.
    ///
    /// The flags are persisted in a second write. If that write fails the
    /// error is returned, but the account from the first write remains stored
    /// as a regular account; retry with [`AccountManager::promote_to_admin`].
    ///
    /// # Errors
    ///
    /// Same as [`AccountManager::create_user`], plus repository errors from the
    /// second write.
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &SecretString,
        full_name: Option<&str>,
    ) -> Result<Account, AccountError> {
        let created = self
            .create_user(NewAccount::new(email, password).with_full_name(full_name))
            .await?;

        let account = self.store.grant_admin(created.id).await?;

        tracing::info!(account_id = %account.id, "Superuser created");
        Ok(account)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if no account has this ID.
    pub async fn get(&self, id: AccountId) -> Result<Account, AccountError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    /// Get an account by email. The input is normalized before the lookup.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidEmail` if the email is malformed.
    /// Returns `AccountError::NotFound` if no account uses this email.
    pub async fn get_by_email(&self, email: &str) -> Result<Account, AccountError> {
        let email = Email::normalized(email)?;
        self.store
            .get_by_email(&email)
            .await?
            .ok_or(AccountError::NotFound)
    }

    /// List every account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the store fails.
    pub async fn list(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.store.list_all().await?)
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Verify an email/password pair and record the login.
    ///
    /// Unknown emails are checked against a dummy hash, so they take as long
    /// as a wrong password.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCredentials` if the email is unknown, the
    /// password is wrong, or the account is inactive.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Account, AccountError> {
        let Ok(email) = Email::normalized(email) else {
            password::verify_dummy(password.expose_secret());
            return Err(AccountError::InvalidCredentials);
        };

        let Some(account) = self.store.get_by_email(&email).await? else {
            password::verify_dummy(password.expose_secret());
            tracing::warn!("Login attempt for unknown email");
            return Err(AccountError::InvalidCredentials);
        };

        if password::verify_password(password.expose_secret(), &account.password_hash).is_err() {
            tracing::warn!(account_id = %account.id, "Login attempt with wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        if !account.active {
            tracing::warn!(account_id = %account.id, "Login attempt for inactive account");
            return Err(AccountError::InvalidCredentials);
        }

        // Deactivation may land between the check above and this write.
        let Some(account) = self.store.record_login(account.id, Utc::now()).await? else {
            tracing::warn!(account_id = %account.id, "Account deactivated during login");
            return Err(AccountError::InvalidCredentials);
        };

        Ok(account)
    }

    /// Replace an account's password.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::MissingRequiredField` if the password is empty.
    /// Returns `AccountError::PasswordTooShort` if a minimum length is configured and not met.
    /// Returns `AccountError::NotFound` if no account has this ID.
    #[instrument(skip(self, password))]
    pub async fn set_password(
        &self,
        id: AccountId,
        password: &SecretString,
    ) -> Result<Account, AccountError> {
        let plaintext = password.expose_secret();
        self.validate_password(plaintext)?;
        let password_hash = password::hash_password(plaintext)?;

        let account = self.store.set_password_hash(id, &password_hash).await?;

        tracing::info!("Password changed");
        Ok(account)
    }

    // =========================================================================
    // Flags
    // =========================================================================

    /// Grant staff access.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if no account has this ID.
    #[instrument(skip(self))]
    pub async fn promote_to_staff(&self, id: AccountId) -> Result<Account, AccountError> {
        let account = self.store.grant_staff(id).await?;
        tracing::info!("Account promoted to staff");
        Ok(account)
    }

    /// Grant admin access. Admins are always staff as well.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if no account has this ID.
    #[instrument(skip(self))]
    pub async fn promote_to_admin(&self, id: AccountId) -> Result<Account, AccountError> {
        let account = self.store.grant_admin(id).await?;
        tracing::info!("Account promoted to admin");
        Ok(account)
    }

    /// Block the account from authenticating.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if no account has this ID.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: AccountId) -> Result<Account, AccountError> {
        let account = self.store.set_active(id, false).await?;
        tracing::info!("Account deactivated");
        Ok(account)
    }

    /// Allow a deactivated account to authenticate again.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if no account has this ID.
    #[instrument(skip(self))]
    pub async fn reactivate(&self, id: AccountId) -> Result<Account, AccountError> {
        let account = self.store.set_active(id, true).await?;
        tracing::info!("Account reactivated");
        Ok(account)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn validate_password(&self, plaintext: &str) -> Result<(), AccountError> {
        if plaintext.is_empty() {
            return Err(AccountError::MissingRequiredField("password"));
        }
        if plaintext.chars().count() < self.min_password_length {
            return Err(AccountError::PasswordTooShort {
                min: self.min_password_length,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Principal;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use accounts_core::HashedPassword;
    use chrono::DateTime;

    fn manager() -> AccountManager<MemoryStore> {
        AccountManager::new(MemoryStore::new())
    }

    /// Store that can deactivate the target account right before the next
    /// login or password write lands, or fail the next flag grant.
    #[derive(Clone, Default)]
    struct InterleavingStore {
        inner: MemoryStore,
        deactivate_next: Arc<AtomicBool>,
        fail_next_grant: Arc<AtomicBool>,
    }

    impl InterleavingStore {
        fn deactivate_before_next_write(&self) {
            self.deactivate_next.store(true, Ordering::SeqCst);
        }

        fn fail_next_grant(&self) {
            self.fail_next_grant.store(true, Ordering::SeqCst);
        }

        fn grant_fails(&self) -> Result<(), RepositoryError> {
            if self.fail_next_grant.swap(false, Ordering::SeqCst) {
                return Err(RepositoryError::DataCorruption("connection lost".to_owned()));
            }
            Ok(())
        }

        async fn interleave(&self, id: AccountId) {
            if self.deactivate_next.swap(false, Ordering::SeqCst) {
                AccountManager::new(self.inner.clone())
                    .deactivate(id)
                    .await
                    .unwrap();
            }
        }
    }

    impl AccountStore for InterleavingStore {
        async fn insert(&self, account: InsertAccount) -> Result<Account, RepositoryError> {
            AccountStore::insert(&self.inner, account).await
        }

        async fn set_active(
            &self,
            id: AccountId,
            active: bool,
        ) -> Result<Account, RepositoryError> {
            AccountStore::set_active(&self.inner, id, active).await
        }

        async fn grant_staff(&self, id: AccountId) -> Result<Account, RepositoryError> {
            self.grant_fails()?;
            self.inner.grant_staff(id).await
        }

        async fn grant_admin(&self, id: AccountId) -> Result<Account, RepositoryError> {
            self.grant_fails()?;
            self.inner.grant_admin(id).await
        }

        async fn set_password_hash(
            &self,
            id: AccountId,
            password_hash: &HashedPassword,
        ) -> Result<Account, RepositoryError> {
            self.interleave(id).await;
            self.inner.set_password_hash(id, password_hash).await
        }

        async fn record_login(
            &self,
            id: AccountId,
            at: DateTime<Utc>,
        ) -> Result<Option<Account>, RepositoryError> {
            self.interleave(id).await;
            self.inner.record_login(id, at).await
        }

        async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
            AccountStore::get_by_id(&self.inner, id).await
        }

        async fn get_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
            self.inner.get_by_email(email).await
        }

        async fn list_all(&self) -> Result<Vec<Account>, RepositoryError> {
            self.inner.list_all().await
        }
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s)
    }

    #[tokio::test]
    async fn test_create_user_defaults() {
        let manager = manager();
        let pw = secret("pw");
        let account = manager
            .create_user(NewAccount::new("a@b.com", &pw))
            .await
            .unwrap();

        assert!(account.active);
        assert!(!account.staff);
        assert!(!account.admin);
        assert!(account.full_name.is_none());
        assert!(account.last_login.is_none());
    }

    #[tokio::test]
    async fn test_create_user_flag_overrides() {
        let manager = manager();
        let pw = secret("pw");
        let account = manager
            .create_user(NewAccount::new("a@b.com", &pw).active(false).staff(true))
            .await
            .unwrap();

        assert!(!account.active);
        assert!(account.staff);
        assert!(!account.admin);
    }

    #[tokio::test]
    async fn test_create_user_missing_email() {
        let manager = manager();
        let pw = secret("pw");
        for email in ["", "   "] {
            let err = manager
                .create_user(NewAccount::new(email, &pw))
                .await
                .unwrap_err();
            assert!(matches!(err, AccountError::MissingRequiredField("email")));
        }
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_user_missing_password() {
        let manager = manager();
        let pw = secret("");
        let err = manager
            .create_user(NewAccount::new("a@b.com", &pw))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::MissingRequiredField("password")));
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_user_invalid_email() {
        let manager = manager();
        let pw = secret("pw");
        let err = manager
            .create_user(NewAccount::new("not-an-email", &pw))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn test_create_user_normalizes_email() {
        let manager = manager();
        let pw = secret("pw");
        let account = manager
            .create_user(NewAccount::new(" Jane@EXAMPLE.com ", &pw))
            .await
            .unwrap();
        assert_eq!(account.email.as_str(), "Jane@example.com");
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let manager = manager();
        let pw = secret("correct horse");
        let account = manager
            .create_user(NewAccount::new("a@b.com", &pw))
            .await
            .unwrap();

        assert_ne!(account.password_hash.as_str(), "correct horse");
        assert!(account.check_password("correct horse"));
    }

    #[tokio::test]
    async fn test_blank_full_name_is_absent() {
        let manager = manager();
        let pw = secret("pw");
        let account = manager
            .create_user(NewAccount::new("a@b.com", &pw).with_full_name(Some("  ")))
            .await
            .unwrap();
        assert!(account.full_name.is_none());
        assert_eq!(account.display_name(), "a@b.com");
    }

    #[tokio::test]
    async fn test_duplicate_normalized_email() {
        let manager = manager();
        let pw = secret("pw");
        manager
            .create_user(NewAccount::new("jane@example.com", &pw))
            .await
            .unwrap();

        let err = manager
            .create_user(NewAccount::new("jane@EXAMPLE.COM", &pw))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AccountError::UniquenessViolation(ref email) if email == "jane@example.com")
        );
    }

    #[tokio::test]
    async fn test_local_part_case_is_significant() {
        let manager = manager();
        let pw = secret("pw");
        manager
            .create_user(NewAccount::new("jane@example.com", &pw))
            .await
            .unwrap();
        assert!(
            manager
                .create_user(NewAccount::new("Jane@example.com", &pw))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_create_staff_user() {
        let manager = manager();
        let pw = secret("pw");
        let account = manager
            .create_staff_user("staff@example.com", &pw, Some("Sam Staff"))
            .await
            .unwrap();

        assert!(account.staff);
        assert!(!account.admin);
        assert_eq!(account.display_name(), "Sam Staff");

        let stored = manager.get(account.id).await.unwrap();
        assert!(stored.staff);
    }

    #[tokio::test]
    async fn test_create_superuser() {
        let manager = manager();
        let pw = secret("pw");
        let account = manager
            .create_superuser("root@example.com", &pw, None)
            .await
            .unwrap();

        assert!(account.staff);
        assert!(account.admin);
        assert!(account.active);

        let stored = manager.get_by_email("root@Example.com").await.unwrap();
        assert!(stored.staff && stored.admin);
    }

    #[tokio::test]
    async fn test_failed_grant_leaves_regular_account() {
        let store = InterleavingStore::default();
        let manager = AccountManager::new(store.clone());
        let pw = secret("pw");

        store.fail_next_grant();
        assert!(matches!(
            manager.create_superuser("root@example.com", &pw, None).await,
            Err(AccountError::Repository(_))
        ));

        let stored = manager.get_by_email("root@example.com").await.unwrap();
        assert!(!stored.staff && !stored.admin);

        let promoted = manager.promote_to_admin(stored.id).await.unwrap();
        assert!(promoted.staff && promoted.admin);
    }

    #[tokio::test]
    async fn test_create_superuser_validates() {
        let manager = manager();
        let pw = secret("");
        let err = manager
            .create_superuser("root@example.com", &pw, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::MissingRequiredField("password")));
    }

    #[tokio::test]
    async fn test_min_password_length() {
        let manager = manager().with_min_password_length(8);
        let short = secret("short");
        let err = manager
            .create_user(NewAccount::new("a@b.com", &short))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::PasswordTooShort { min: 8 }));

        let long = secret("long enough");
        assert!(manager.create_user(NewAccount::new("a@b.com", &long)).await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_records_login() {
        let manager = manager();
        let pw = secret("correct horse");
        manager
            .create_user(NewAccount::new("a@b.com", &pw))
            .await
            .unwrap();

        let account = manager.authenticate("a@B.COM", &pw).await.unwrap();
        assert!(account.last_login.is_some());

        let stored = manager.get(account.id).await.unwrap();
        assert_eq!(stored.last_login, account.last_login);
    }

    #[tokio::test]
    async fn test_authenticate_failures() {
        let manager = manager();
        let pw = secret("correct horse");
        let account = manager
            .create_user(NewAccount::new("a@b.com", &pw))
            .await
            .unwrap();

        let wrong = secret("battery staple");
        assert!(matches!(
            manager.authenticate("a@b.com", &wrong).await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            manager.authenticate("nobody@b.com", &pw).await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            manager.authenticate("garbage", &pw).await,
            Err(AccountError::InvalidCredentials)
        ));

        manager.deactivate(account.id).await.unwrap();
        assert!(matches!(
            manager.authenticate("a@b.com", &pw).await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_deactivation_during_login_wins() {
        let store = InterleavingStore::default();
        let manager = AccountManager::new(store.clone());
        let pw = secret("correct horse");
        let account = manager
            .create_user(NewAccount::new("a@b.com", &pw))
            .await
            .unwrap();

        store.deactivate_before_next_write();
        assert!(matches!(
            manager.authenticate("a@b.com", &pw).await,
            Err(AccountError::InvalidCredentials)
        ));

        let stored = manager.get(account.id).await.unwrap();
        assert!(!stored.active);
        assert!(stored.last_login.is_none());
    }

    #[tokio::test]
    async fn test_password_change_keeps_concurrent_deactivation() {
        let store = InterleavingStore::default();
        let manager = AccountManager::new(store.clone());
        let old = secret("old password");
        let account = manager
            .create_user(NewAccount::new("a@b.com", &old))
            .await
            .unwrap();

        store.deactivate_before_next_write();
        let new = secret("new password");
        let changed = manager.set_password(account.id, &new).await.unwrap();
        assert!(!changed.active);
        assert!(changed.check_password("new password"));

        let stored = manager.get(account.id).await.unwrap();
        assert!(!stored.active);
    }

    #[tokio::test]
    async fn test_set_password() {
        let manager = manager();
        let old = secret("old password");
        let account = manager
            .create_user(NewAccount::new("a@b.com", &old))
            .await
            .unwrap();

        let new = secret("new password");
        manager.set_password(account.id, &new).await.unwrap();

        assert!(manager.authenticate("a@b.com", &new).await.is_ok());
        assert!(manager.authenticate("a@b.com", &old).await.is_err());

        let empty = secret("");
        assert!(matches!(
            manager.set_password(account.id, &empty).await,
            Err(AccountError::MissingRequiredField("password"))
        ));
    }

    #[tokio::test]
    async fn test_promotions_and_activation() {
        let manager = manager();
        let pw = secret("pw");
        let account = manager
            .create_user(NewAccount::new("a@b.com", &pw))
            .await
            .unwrap();

        let staff = manager.promote_to_staff(account.id).await.unwrap();
        assert!(staff.staff && !staff.admin);

        let admin = manager.promote_to_admin(account.id).await.unwrap();
        assert!(admin.staff && admin.admin);

        let inactive = manager.deactivate(account.id).await.unwrap();
        assert!(!inactive.active);
        assert!(!manager.get(account.id).await.unwrap().active);

        let active = manager.reactivate(account.id).await.unwrap();
        assert!(active.active);
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let manager = manager();
        assert!(matches!(
            manager.promote_to_staff(AccountId::new(42)).await,
            Err(AccountError::NotFound)
        ));
        assert!(matches!(
            manager.get(AccountId::new(42)).await,
            Err(AccountError::NotFound)
        ));
    }
}
