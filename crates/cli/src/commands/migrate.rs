//! Database migration command.
//!
//! Migrations live in `crates/accounts/migrations/` and are embedded in the binary.

use accounts::db;

use super::{CommandError, connect};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let (_, pool) = connect().await?;

    tracing::info!("Running accounts migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Accounts migrations complete!");
    Ok(())
}
