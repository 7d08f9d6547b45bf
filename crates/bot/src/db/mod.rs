//! Database operations for the bot's `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Everyone who has started the bot
//! - `admins` - Telegram ids with admin panel access and their role
//! - `categories` / `projects` - The catalog
//! - `cart_items` / `purchases` - Shopping cart and owned projects
//! - `orders` - Custom work requests
//! - `support_tickets` - Support conversations
//! - `broadcasts` - Mass notifications and their delivery counters
//! - `reviews` - Star ratings of purchased projects
//!
//! # Migrations
//!
//! Migrations are stored in `crates/bot/migrations/` and run via:
//! ```bash
//! cargo run -p studybot-cli -- migrate
//! ```

pub mod admins;
pub mod broadcasts;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod projects;
pub mod purchases;
pub mod reviews;
pub mod stats;
pub mod tickets;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admins::AdminRepository;
pub use cart::CartRepository;
pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use projects::ProjectRepository;
pub use purchases::PurchaseRepository;
pub use reviews::ReviewRepository;
pub use tickets::TicketRepository;
pub use users::{UserFilter, UserRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate category name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Turn unique and foreign key violations into [`RepositoryError::Conflict`]
    /// carrying `message`; every other error is kept as is.
    pub(crate) fn conflict_on_violation(err: sqlx::Error, message: impl Into<String>) -> Self {
        let is_violation = err.as_database_error().is_some_and(|db| {
            db.is_unique_violation() || db.is_foreign_key_violation()
        });
        if is_violation {
            Self::Conflict(message.into())
        } else {
            Self::Database(err)
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Widen a `LIMIT`/`OFFSET` value to the `BIGINT` Postgres expects.
pub(crate) fn to_i64(value: u32) -> i64 {
    i64::from(value)
}
