//! In-memory store.
//!
//! Implements both [`AccountStore`] and [`GuestEmailStore`] behind a single
//! mutex, so the email uniqueness check and the insert happen atomically.
//! Cloning a `MemoryStore` shares the underlying data.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use accounts_core::{AccountId, Email, GuestEmailId, HashedPassword};

use super::{AccountStore, GuestEmailStore, InsertAccount, RepositoryError};
use crate::models::{Account, GuestEmail};

#[derive(Debug, Default)]
struct State {
    accounts: Vec<Account>,
    guest_emails: Vec<GuestEmail>,
    next_account_id: i32,
    next_guest_email_id: i32,
}

/// Store that keeps accounts and guest emails in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // No operation leaves `State` half-updated, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `apply` to one stored account under the lock.
    fn update_account<F>(&self, id: AccountId, apply: F) -> Result<Account, RepositoryError>
    where
        F: FnOnce(&mut Account),
    {
        let mut state = self.lock();
        let stored = state
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;

        apply(stored);
        Ok(stored.clone())
    }
}

impl AccountStore for MemoryStore {
    async fn insert(&self, account: InsertAccount) -> Result<Account, RepositoryError> {
        let mut state = self.lock();

        if state.accounts.iter().any(|a| a.email == account.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        state.next_account_id += 1;
        let created = Account {
            id: AccountId::new(state.next_account_id),
            email: account.email,
            full_name: account.full_name,
            password_hash: account.password_hash,
            active: account.active,
            staff: account.staff,
            admin: account.admin,
            last_login: None,
            created_at: Utc::now(),
        };
        state.accounts.push(created.clone());

        Ok(created)
    }

    async fn set_active(&self, id: AccountId, active: bool) -> Result<Account, RepositoryError> {
        self.update_account(id, |account| account.active = active)
    }

    async fn grant_staff(&self, id: AccountId) -> Result<Account, RepositoryError> {
        self.update_account(id, |account| account.staff = true)
    }

    async fn grant_admin(&self, id: AccountId) -> Result<Account, RepositoryError> {
        self.update_account(id, |account| {
            account.staff = true;
            account.admin = true;
        })
    }

    async fn set_password_hash(
        &self,
        id: AccountId,
        password_hash: &HashedPassword,
    ) -> Result<Account, RepositoryError> {
        self.update_account(id, |account| {
            account.password_hash = password_hash.clone();
        })
    }

    async fn record_login(
        &self,
        id: AccountId,
        at: DateTime<Utc>,
    ) -> Result<Option<Account>, RepositoryError> {
        let mut state = self.lock();
        let Some(stored) = state.accounts.iter_mut().find(|a| a.id == id && a.active) else {
            return Ok(None);
        };

        stored.last_login = Some(at);
        Ok(Some(stored.clone()))
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.lock().accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .lock()
            .accounts
            .iter()
            .find(|a| &a.email == email)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Account>, RepositoryError> {
        Ok(self.lock().accounts.clone())
    }
}

impl GuestEmailStore for MemoryStore {
    async fn insert(&self, email: &Email) -> Result<GuestEmail, RepositoryError> {
        let mut state = self.lock();
        state.next_guest_email_id += 1;

        let now = Utc::now();
        let created = GuestEmail {
            id: GuestEmailId::new(state.next_guest_email_id),
            email: email.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        state.guest_emails.push(created.clone());

        Ok(created)
    }

    async fn set_active(
        &self,
        id: GuestEmailId,
        active: bool,
    ) -> Result<GuestEmail, RepositoryError> {
        let mut state = self.lock();
        let stored = state
            .guest_emails
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(RepositoryError::NotFound)?;

        stored.active = active;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn get_by_id(&self, id: GuestEmailId) -> Result<Option<GuestEmail>, RepositoryError> {
        Ok(self.lock().guest_emails.iter().find(|g| g.id == id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<GuestEmail>, RepositoryError> {
        Ok(self
            .lock()
            .guest_emails
            .iter()
            .rev()
            .filter(|g| g.active)
            .cloned()
            .collect())
    }
}
