//! Accounts - email-keyed user accounts.
//!
//! # Architecture
//!
//! - [`models`] - `Account`, `GuestEmail`, and the `Principal` contract an
//!   authentication layer needs from its user type
//! - [`services`] - `AccountManager` (the account factory plus lifecycle
//!   operations) and `GuestEmailService`
//! - [`db`] - Storage seams with `PostgreSQL` and in-memory implementations
//! - [`config`] - Environment-based configuration
//!
//! # Example
//!
//! ```no_run
//! use accounts::{AccountManager, AccountsConfig, db};
//! use secrecy::SecretString;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AccountsConfig::from_env()?;
//! let pool = db::create_pool(&config.database).await?;
//! let manager = AccountManager::new(db::AccountRepository::new(&pool))
//!     .with_min_password_length(config.min_password_length);
//!
//! let password = SecretString::from("correct horse battery staple");
//! let admin = manager
//!     .create_superuser("admin@example.com", &password, Some("Site Admin"))
//!     .await?;
//! assert!(admin.staff && admin.admin);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod password;
pub mod services;

pub use config::{AccountsConfig, ConfigError, DatabaseConfig};
pub use error::AccountError;
pub use models::{Account, GuestEmail, NewAccount, Principal};
pub use services::{AccountManager, GuestEmailService};
