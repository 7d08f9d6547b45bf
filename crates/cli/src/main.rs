//! `StudyBot` CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run bot database migrations
//! studybot-cli migrate
//!
//! # Insert the sample catalog
//! studybot-cli seed
//!
//! # Create the uploads directory tree
//! studybot-cli init --uploads-dir uploads
//!
//! # Manage admin access
//! studybot-cli admin grant --telegram-id 123456789 --role manager
//! studybot-cli admin revoke --telegram-id 123456789
//! studybot-cli admin list
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studybot-cli")]
#[command(author, version, about = "StudyBot CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with sample categories and projects
    Seed,
    /// Create upload directories
    Init {
        /// Root directory for uploaded files
        #[arg(long, env = "UPLOADS_DIR", default_value = "uploads")]
        uploads_dir: PathBuf,
    },
    /// Manage admin access
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant a role to a Telegram account
    Grant {
        /// Telegram user id
        #[arg(short, long)]
        telegram_id: i64,

        /// Admin role (`admin`, `manager`, `content_manager`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
    /// Remove admin access
    Revoke {
        /// Telegram user id
        #[arg(short, long)]
        telegram_id: i64,
    },
    /// List admins
    List,
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Init { uploads_dir } => commands::init::run(&uploads_dir).await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { telegram_id, role } => {
                commands::admin::grant(telegram_id, &role).await?;
            }
            AdminAction::Revoke { telegram_id } => commands::admin::revoke(telegram_id).await?,
            AdminAction::List => commands::admin::list().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
