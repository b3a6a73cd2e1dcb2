//! Accounts Core - Shared types library.
//!
//! This crate provides the types shared by the account components:
//! - `accounts` - Account and guest-email models, storage and services
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no password hashing. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and password hashes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
