//! Admin dashboard statistics.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::DashboardStats;

#[derive(Debug, sqlx::FromRow)]
struct DashboardRow {
    total_users: i64,
    new_users_week: i64,
    blocked_users: i64,
    active_projects: i64,
    categories: i64,
    new_orders: i64,
    orders_in_work: i64,
    completed_orders: i64,
    purchases: i64,
    revenue: Decimal,
    open_tickets: i64,
}

impl From<DashboardRow> for DashboardStats {
    fn from(row: DashboardRow) -> Self {
        Self {
            total_users: row.total_users,
            new_users_week: row.new_users_week,
            blocked_users: row.blocked_users,
            active_projects: row.active_projects,
            categories: row.categories,
            new_orders: row.new_orders,
            orders_in_work: row.orders_in_work,
            completed_orders: row.completed_orders,
            purchases: row.purchases,
            revenue: row.revenue,
            open_tickets: row.open_tickets,
        }
    }
}

/// Collect the numbers shown on the admin dashboard in one round trip.
///
/// Revenue counts catalog purchases plus paid custom orders.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn dashboard(pool: &PgPool) -> Result<DashboardStats, RepositoryError> {
    let row = sqlx::query_as::<_, DashboardRow>(
        r"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE created_at >= NOW() - INTERVAL '7 days') AS new_users_week,
            (SELECT COUNT(*) FROM users WHERE is_blocked) AS blocked_users,
            (SELECT COUNT(*) FROM projects WHERE is_active) AS active_projects,
            (SELECT COUNT(*) FROM categories) AS categories,
            (SELECT COUNT(*) FROM orders WHERE status IN ('new', 'under_review')) AS new_orders,
            (SELECT COUNT(*) FROM orders
              WHERE status IN ('accepted', 'in_progress', 'ready_for_check')) AS orders_in_work,
            (SELECT COUNT(*) FROM orders WHERE status = 'completed') AS completed_orders,
            (SELECT COUNT(*) FROM purchases) AS purchases,
            (COALESCE((SELECT SUM(price) FROM purchases), 0)
              + COALESCE((SELECT SUM(price) FROM orders WHERE is_paid), 0)) AS revenue,
            (SELECT COUNT(*) FROM support_tickets WHERE status <> 'closed') AS open_tickets
        ",
    )
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}
