//! Guest email commands.

use accounts::GuestEmailService;
use accounts::db::GuestEmailRepository;
use accounts_core::GuestEmailId;

use super::{CommandError, connect};

/// Capture a guest email.
///
/// # Errors
///
/// Returns an error if the email is empty or malformed.
pub async fn add(email: &str) -> Result<(), CommandError> {
    let (_, pool) = connect().await?;

    let guest = GuestEmailService::new(GuestEmailRepository::new(&pool))
        .capture(email)
        .await?;

    tracing::info!("Guest email captured: ID {}, Email: {}", guest.id, guest);
    Ok(())
}

/// Deactivate a guest email.
///
/// # Errors
///
/// Returns an error if no guest email has this ID.
pub async fn deactivate(id: i32) -> Result<(), CommandError> {
    let (_, pool) = connect().await?;

    let guest = GuestEmailService::new(GuestEmailRepository::new(&pool))
        .deactivate(GuestEmailId::new(id))
        .await?;

    tracing::info!("Guest email deactivated: ID {}, Email: {}", guest.id, guest);
    Ok(())
}

/// List active guest emails.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list(json: bool) -> Result<(), CommandError> {
    let (_, pool) = connect().await?;

    let guests = GuestEmailService::new(GuestEmailRepository::new(&pool))
        .list_active()
        .await?;

    if json {
        let output = serde_json::to_string_pretty(&guests)?;
        #[allow(clippy::print_stdout)]
        {
            println!("{output}");
        }
        return Ok(());
    }

    tracing::info!("{} active guest email(s)", guests.len());
    for guest in &guests {
        tracing::info!("  ID {}: {} (captured {})", guest.id, guest, guest.created_at);
    }
    Ok(())
}
