//! Accounts CLI - Database migrations and account management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! accounts-cli migrate
//!
//! # Create accounts (password is read from ACCOUNTS_PASSWORD)
//! ACCOUNTS_PASSWORD=... accounts-cli user create -e jane@example.com -n "Jane Doe"
//! ACCOUNTS_PASSWORD=... accounts-cli user create-staff -e sam@example.com
//! ACCOUNTS_PASSWORD=... accounts-cli user create-superuser -e root@example.com
//!
//! # Change flags
//! accounts-cli user promote -e sam@example.com --to admin
//! accounts-cli user deactivate -e jane@example.com
//!
//! # Guest emails
//! accounts-cli guest add -e visitor@example.com
//! accounts-cli guest list --json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user` - Create, promote, (de)activate and list accounts
//! - `guest` - Capture, deactivate and list guest emails

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "accounts-cli")]
#[command(author, version, about = "Account management tools")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage guest emails
    Guest {
        #[command(subcommand)]
        action: GuestAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account with explicit flags
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Grant staff access
        #[arg(long)]
        staff: bool,

        /// Grant admin access
        #[arg(long)]
        admin: bool,

        /// Create the account deactivated
        #[arg(long)]
        inactive: bool,
    },
    /// Create a staff account
    CreateStaff {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Create a superuser (staff and admin)
    CreateSuperuser {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Grant staff or admin access to an existing account
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Access level to grant
        #[arg(long, value_enum)]
        to: Level,
    },
    /// Block an account from logging in
    Deactivate {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Allow a deactivated account to log in again
    Reactivate {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// List all accounts
    List {
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GuestAction {
    /// Capture a guest email
    Add {
        /// Guest email address
        #[arg(short, long)]
        email: String,
    },
    /// Deactivate a guest email
    Deactivate {
        /// Guest email record ID
        #[arg(long)]
        id: i32,
    },
    /// List active guest emails
    List {
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Level {
    Staff,
    Admin,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.json_logs);

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Defaults to info level for our crates if `RUST_LOG` is not set.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "accounts=info,accounts_cli=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                staff,
                admin,
                inactive,
            } => {
                commands::user::create(&email, name.as_deref(), staff, admin, !inactive).await?;
            }
            UserAction::CreateStaff { email, name } => {
                commands::user::create_staff(&email, name.as_deref()).await?;
            }
            UserAction::CreateSuperuser { email, name } => {
                commands::user::create_superuser(&email, name.as_deref()).await?;
            }
            UserAction::Promote { email, to } => match to {
                Level::Staff => commands::user::promote_to_staff(&email).await?,
                Level::Admin => commands::user::promote_to_admin(&email).await?,
            },
            UserAction::Deactivate { email } => commands::user::set_active(&email, false).await?,
            UserAction::Reactivate { email } => commands::user::set_active(&email, true).await?,
            UserAction::List { json } => commands::user::list(json).await?,
        },
        Commands::Guest { action } => match action {
            GuestAction::Add { email } => commands::guest::add(&email).await?,
            GuestAction::Deactivate { id } => commands::guest::deactivate(id).await?,
            GuestAction::List { json } => commands::guest::list(json).await?,
        },
    }
    Ok(())
}
