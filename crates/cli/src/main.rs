//! Mirra Beauty CLI - seeding and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Seed settings and the order counter (idempotent)
//! mirra-cli seed
//!
//! # Rehearse the seed against an in-memory store
//! mirra-cli seed --dry-run
//!
//! # Grant a staff role to an existing account
//! mirra-cli admin grant -e staff@example.com -r manager
//! ```
//!
//! # Commands
//!
//! - `seed` - Seed the settings document and order counter
//! - `admin grant` - Assign a role to an account by email

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mirra-cli")]
#[command(author, version, about = "Mirra Beauty CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the settings document and order counter
    Seed {
        /// Run against an in-memory store instead of the hosted API
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage staff accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Assign a role to the account registered under an email
    Grant {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Role to assign (admin, manager, editor, viewer, user)
        #[arg(short, long, default_value = "manager")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { dry_run } => commands::seed::run(dry_run).await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { email, role } => {
                commands::admin::grant_role(&email, &role).await?;
            }
        },
    }
    Ok(())
}
