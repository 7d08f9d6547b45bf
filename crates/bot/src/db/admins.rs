//! Admin repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use studybot_core::{AdminId, AdminRole, TelegramId};

use super::RepositoryError;
use crate::models::Admin;

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: i32,
    telegram_id: i64,
    role: AdminRole,
    created_at: DateTime<Utc>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Self {
            id: AdminId::new(row.id),
            telegram_id: TelegramId::new(row.telegram_id),
            role: row.role,
            created_at: row.created_at,
        }
    }
}

/// Repository for admin panel access.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find an admin by Telegram id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, telegram_id: TelegramId) -> Result<Option<Admin>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, telegram_id, role, created_at FROM admins WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Grant admin access, replacing the role if the id is already an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn grant(
        &self,
        telegram_id: TelegramId,
        role: AdminRole,
    ) -> Result<Admin, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r"
            INSERT INTO admins (telegram_id, role)
            VALUES ($1, $2)
            ON CONFLICT (telegram_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING id, telegram_id, role, created_at
            ",
        )
        .bind(telegram_id)
        .bind(role)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Remove admin access. Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn revoke(&self, telegram_id: TelegramId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM admins WHERE telegram_id = $1")
            .bind(telegram_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List all admins, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Admin>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminRow>(
            "SELECT id, telegram_id, role, created_at FROM admins ORDER BY created_at, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Telegram ids of every admin, for order and ticket notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn telegram_ids(&self) -> Result<Vec<TelegramId>, RepositoryError> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT telegram_id FROM admins ORDER BY id")
            .fetch_all(self.pool)
            .await?;

        Ok(ids.into_iter().map(TelegramId::new).collect())
    }
}
