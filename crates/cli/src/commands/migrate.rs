//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! studybot-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BOT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations live in `crates/bot/migrations/` and are embedded at build time.

use super::{CommandError, connect};

/// Run all pending bot migrations.
///
/// # Errors
///
/// Returns error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running bot migrations...");
    sqlx::migrate!("../bot/migrations").run(&pool).await?;

    tracing::info!("Bot migrations complete!");
    Ok(())
}
