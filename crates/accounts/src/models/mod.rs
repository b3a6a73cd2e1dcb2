//! Domain models.
//!
//! These types represent validated domain objects separate from database row types.

pub mod account;
pub mod guest_email;

pub use account::{Account, NewAccount, Principal};
pub use guest_email::GuestEmail;
