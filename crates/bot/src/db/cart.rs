//! Shopping cart repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use studybot_core::{CartItemId, Price, ProjectId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartLine};

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    project_id: i32,
    title: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    is_active: bool,
    added_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            project_id: ProjectId::new(row.project_id),
            title: row.title,
            price: Price::from_amount(row.price),
            discount_price: row.discount_price.map(Price::from_amount),
            is_active: row.is_active,
            added_at: row.added_at,
        }
    }
}

/// Repository for cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's cart with current project prices, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.id, ci.project_id, p.title, p.price, p.discount_price, p.is_active, ci.added_at
            FROM cart_items ci
            JOIN projects p ON p.id = ci.project_id
            WHERE ci.user_id = $1
            ORDER BY ci.added_at, ci.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Cart {
            lines: rows.into_iter().map(Into::into).collect(),
        })
    }

    /// Add a project. Returns `false` if it was already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the project does not exist.
    pub async fn add(&self, user_id: UserId, project_id: ProjectId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO cart_items (user_id, project_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, project_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(project_id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_violation(e, "project does not exist"))?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a project. Returns `false` if it was not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND project_id = $2")
            .bind(user_id)
            .bind(project_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Empty a user's cart, returning the number of removed lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Returns true if the project is in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM cart_items WHERE user_id = $1 AND project_id = $2)",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Number of lines in the cart, for the main menu badge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
