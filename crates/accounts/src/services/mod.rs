//! Account services.
//!
//! Services own validation and logging; storage is reached through the
//! [`AccountStore`](crate::db::AccountStore) and
//! [`GuestEmailStore`](crate::db::GuestEmailStore) seams.

pub mod accounts;
pub mod guest_emails;

pub use accounts::AccountManager;
pub use guest_emails::GuestEmailService;
