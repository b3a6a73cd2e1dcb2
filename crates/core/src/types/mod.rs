//! Core types for accounts.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;

pub use credential::HashedPassword;
pub use email::{Email, EmailError, normalize_email};
pub use id::*;
