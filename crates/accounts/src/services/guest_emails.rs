//! Guest email capture.

use tracing::instrument;

use accounts_core::{Email, GuestEmailId};

use crate::db::GuestEmailStore;
use crate::error::AccountError;
use crate::models::GuestEmail;

/// Records emails given by visitors who check out or get in touch without an account.
#[derive(Debug, Clone)]
pub struct GuestEmailService<S> {
    store: S,
}

impl<S: GuestEmailStore> GuestEmailService<S> {
    /// Create a service over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Record an email. Capturing the same address twice creates two records.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::MissingRequiredField` if the email is empty.
    /// Returns `AccountError::InvalidEmail` if the email is malformed.
    #[instrument(skip(self))]
    pub async fn capture(&self, email: &str) -> Result<GuestEmail, AccountError> {
        if email.trim().is_empty() {
            return Err(AccountError::MissingRequiredField("email"));
        }
        let email = Email::normalized(email)?;

        let guest = self.store.insert(&email).await?;
        tracing::info!(guest_email_id = %guest.id, "Guest email captured");
        Ok(guest)
    }

    /// Mark a guest email inactive.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if no guest email has this ID.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: GuestEmailId) -> Result<GuestEmail, AccountError> {
        let guest = self.store.set_active(id, false).await?;
        tracing::info!("Guest email deactivated");
        Ok(guest)
    }

    /// Get a guest email by ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if no guest email has this ID.
    pub async fn get(&self, id: GuestEmailId) -> Result<GuestEmail, AccountError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    /// List active guest emails, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the store fails.
    pub async fn list_active(&self) -> Result<Vec<GuestEmail>, AccountError> {
        Ok(self.store.list_active().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> GuestEmailService<MemoryStore> {
        GuestEmailService::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_capture_defaults() {
        let service = service();
        let guest = service.capture("Guest@Example.COM").await.unwrap();

        assert!(guest.active);
        assert_eq!(guest.email.as_str(), "Guest@example.com");
        assert_eq!(guest.created_at, guest.updated_at);
        assert_eq!(guest.to_string(), "Guest@example.com");
    }

    #[tokio::test]
    async fn test_capture_allows_duplicates() {
        let service = service();
        let first = service.capture("guest@example.com").await.unwrap();
        let second = service.capture("guest@example.com").await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(service.list_active().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_capture_validation() {
        let service = service();
        assert!(matches!(
            service.capture("").await,
            Err(AccountError::MissingRequiredField("email"))
        ));
        assert!(matches!(
            service.capture("no-at-symbol").await,
            Err(AccountError::InvalidEmail(_))
        ));
        assert!(service.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_refreshes_updated_at() {
        let service = service();
        let guest = service.capture("guest@example.com").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let deactivated = service.deactivate(guest.id).await.unwrap();
        assert!(!deactivated.active);
        assert_eq!(deactivated.created_at, guest.created_at);
        assert!(deactivated.updated_at > guest.updated_at);

        assert!(!service.get(guest.id).await.unwrap().active);
        assert!(service.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_unknown() {
        let service = service();
        assert!(matches!(
            service.deactivate(GuestEmailId::new(7)).await,
            Err(AccountError::NotFound)
        ));
    }
}
