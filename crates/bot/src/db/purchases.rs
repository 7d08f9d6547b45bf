//! Purchase repository.
//!
//! [`record_purchase`] works on a connection so checkout can record several
//! purchases in one transaction.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use studybot_core::{Price, ProjectId, PurchaseId, UserId};

use super::RepositoryError;
use crate::models::{NewPurchase, OwnedProject, Purchase};

const PURCHASE_COLUMNS: &str =
    "id, user_id, project_id, price, payment_method, transaction_id, created_at";

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: i32,
    user_id: i32,
    project_id: i32,
    price: Decimal,
    payment_method: String,
    transaction_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PurchaseRow> for Purchase {
    fn from(row: PurchaseRow) -> Self {
        Self {
            id: PurchaseId::new(row.id),
            user_id: UserId::new(row.user_id),
            project_id: ProjectId::new(row.project_id),
            price: Price::from_amount(row.price),
            payment_method: row.payment_method,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OwnedProjectRow {
    #[sqlx(flatten)]
    purchase: PurchaseRow,
    title: String,
    has_file: bool,
}

/// Record a purchase unless the user already owns the project.
///
/// On success the project's `purchases_count` is incremented and the project
/// is removed from the user's cart. Returns `None` when the user already
/// owned the project; nothing is changed in that case.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any statement fails.
pub async fn record_purchase(
    conn: &mut PgConnection,
    new: &NewPurchase,
) -> Result<Option<Purchase>, RepositoryError> {
    let row = sqlx::query_as::<_, PurchaseRow>(&format!(
        r"
        INSERT INTO purchases (user_id, project_id, price, payment_method, transaction_id)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, project_id) DO NOTHING
        RETURNING {PURCHASE_COLUMNS}
        "
    ))
    .bind(new.user_id)
    .bind(new.project_id)
    .bind(new.price.amount)
    .bind(&new.payment_method)
    .bind(&new.transaction_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    sqlx::query("UPDATE projects SET purchases_count = purchases_count + 1 WHERE id = $1")
        .bind(new.project_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND project_id = $2")
        .bind(new.user_id)
        .bind(new.project_id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(row.into()))
}

/// Projects the user already owns, read on `conn`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn owned_project_ids(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<HashSet<ProjectId>, RepositoryError> {
    let ids: Vec<ProjectId> =
        sqlx::query_scalar("SELECT project_id FROM purchases WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

    Ok(ids.into_iter().collect())
}

/// Repository for reading purchases.
pub struct PurchaseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PurchaseRepository<'a> {
    /// Create a new purchase repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's purchases with project titles, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<OwnedProject>, RepositoryError> {
        let rows = sqlx::query_as::<_, OwnedProjectRow>(
            r"
            SELECT pu.id, pu.user_id, pu.project_id, pu.price, pu.payment_method,
                   pu.transaction_id, pu.created_at,
                   p.title, (p.file_path IS NOT NULL) AS has_file
            FROM purchases pu
            JOIN projects p ON p.id = pu.project_id
            WHERE pu.user_id = $1
            ORDER BY pu.created_at DESC, pu.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OwnedProject {
                purchase: row.purchase.into(),
                title: row.title,
                has_file: row.has_file,
            })
            .collect())
    }

    /// Returns true if the user owns the project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_purchased(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM purchases WHERE user_id = $1 AND project_id = $2)",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Sum of everything a user has paid for catalog projects and custom orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_spent(&self, user_id: UserId) -> Result<Price, RepositoryError> {
        let total: Decimal = sqlx::query_scalar(
            r"
            SELECT
                COALESCE((SELECT SUM(price) FROM purchases WHERE user_id = $1), 0)
              + COALESCE((SELECT SUM(price) FROM orders WHERE user_id = $1 AND is_paid), 0)
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(Price::from_amount(total))
    }
}
