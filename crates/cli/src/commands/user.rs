//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! ACCOUNTS_PASSWORD=... accounts-cli user create -e jane@example.com -n "Jane Doe"
//! ACCOUNTS_PASSWORD=... accounts-cli user create-superuser -e root@example.com
//! accounts-cli user promote -e jane@example.com --to staff
//! accounts-cli user list --json
//! ```

use accounts::db::AccountRepository;
use accounts::{Account, AccountManager, NewAccount};
use sqlx::PgPool;

use super::{CommandError, connect, password_from_env};

fn manager(pool: &PgPool, min_password_length: usize) -> AccountManager<AccountRepository<'_>> {
    AccountManager::new(AccountRepository::new(pool)).with_min_password_length(min_password_length)
}

fn log_account(action: &str, account: &Account) {
    tracing::info!(
        "{action}: ID {}, Email: {}, Name: {}, Active: {}, Staff: {}, Admin: {}",
        account.id,
        account.email,
        account.display_name(),
        account.active,
        account.staff,
        account.admin
    );
}

/// Create an account with explicit flags.
///
/// # Errors
///
/// Returns an error if the password is not set, validation fails, or the email is taken.
pub async fn create(
    email: &str,
    name: Option<&str>,
    staff: bool,
    admin: bool,
    active: bool,
) -> Result<(), CommandError> {
    let password = password_from_env()?;
    let (config, pool) = connect().await?;

    let account = manager(&pool, config.min_password_length)
        .create_user(
            NewAccount::new(email, &password)
                .with_full_name(name)
                .staff(staff)
                .admin(admin)
                .active(active),
        )
        .await?;

    if account.admin && !account.staff {
        tracing::warn!("Admin account created without staff access; use create-superuser for both.");
    }
    log_account("Account created", &account);
    Ok(())
}

/// Create a staff account.
///
/// # Errors
///
/// Returns an error if the password is not set, validation fails, or the email is taken.
pub async fn create_staff(email: &str, name: Option<&str>) -> Result<(), CommandError> {
    let password = password_from_env()?;
    let (config, pool) = connect().await?;

    let account = manager(&pool, config.min_password_length)
        .create_staff_user(email, &password, name)
        .await?;

    log_account("Staff account created", &account);
    Ok(())
}

/// Create a superuser.
///
/// # Errors
///
/// Returns an error if the password is not set, validation fails, or the email is taken.
pub async fn create_superuser(email: &str, name: Option<&str>) -> Result<(), CommandError> {
    let password = password_from_env()?;
    let (config, pool) = connect().await?;

    let account = manager(&pool, config.min_password_length)
        .create_superuser(email, &password, name)
        .await?;

    log_account("Superuser created", &account);
    Ok(())
}

/// Grant staff access.
///
/// # Errors
///
/// Returns an error if no account uses this email.
pub async fn promote_to_staff(email: &str) -> Result<(), CommandError> {
    let (config, pool) = connect().await?;
    let manager = manager(&pool, config.min_password_length);

    let account = manager.get_by_email(email).await?;
    let account = manager.promote_to_staff(account.id).await?;

    log_account("Account promoted", &account);
    Ok(())
}

/// Grant admin (and staff) access.
///
/// # Errors
///
/// Returns an error if no account uses this email.
pub async fn promote_to_admin(email: &str) -> Result<(), CommandError> {
    let (config, pool) = connect().await?;
    let manager = manager(&pool, config.min_password_length);

    let account = manager.get_by_email(email).await?;
    let account = manager.promote_to_admin(account.id).await?;

    log_account("Account promoted", &account);
    Ok(())
}

/// Deactivate or reactivate an account.
///
/// # Errors
///
/// Returns an error if no account uses this email.
pub async fn set_active(email: &str, active: bool) -> Result<(), CommandError> {
    let (config, pool) = connect().await?;
    let manager = manager(&pool, config.min_password_length);

    let account = manager.get_by_email(email).await?;
    let account = if active {
        manager.reactivate(account.id).await?
    } else {
        manager.deactivate(account.id).await?
    };

    log_account(if active { "Account reactivated" } else { "Account deactivated" }, &account);
    Ok(())
}

/// List all accounts.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list(json: bool) -> Result<(), CommandError> {
    let (config, pool) = connect().await?;
    let accounts = manager(&pool, config.min_password_length).list().await?;

    if json {
        let output = serde_json::to_string_pretty(&accounts)?;
        #[allow(clippy::print_stdout)]
        {
            println!("{output}");
        }
        return Ok(());
    }

    tracing::info!("{} account(s)", accounts.len());
    for account in &accounts {
        log_account("Account", account);
    }
    Ok(())
}
