//! Database operations for broadcasts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use studybot_core::{BroadcastAudience, BroadcastId, TelegramId};

use super::{RepositoryError, to_i64};
use crate::models::{Broadcast, BroadcastReport};

const BROADCAST_COLUMNS: &str = "id, admin_telegram_id, message, target_audience, total_sent, \
     successful, failed, created_at, sent_at";

/// Users matching `$1` (audience) and `$2` (active window in days); never blocked.
const AUDIENCE_CLAUSE: &str = r"
    NOT u.is_blocked
    AND CASE $1::broadcast_audience
        WHEN 'all' THEN TRUE
        WHEN 'active' THEN u.last_active_at >= NOW() - make_interval(days => $2)
        WHEN 'buyers' THEN EXISTS (SELECT 1 FROM purchases p WHERE p.user_id = u.id)
        WHEN 'non_buyers' THEN NOT EXISTS (SELECT 1 FROM purchases p WHERE p.user_id = u.id)
    END";

#[derive(Debug, sqlx::FromRow)]
struct BroadcastRow {
    id: i32,
    admin_telegram_id: i64,
    message: String,
    target_audience: BroadcastAudience,
    total_sent: i32,
    successful: i32,
    failed: i32,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
}

impl TryFrom<BroadcastRow> for Broadcast {
    type Error = RepositoryError;

    fn try_from(row: BroadcastRow) -> Result<Self, Self::Error> {
        if row.successful + row.failed != row.total_sent {
            return Err(RepositoryError::DataCorruption(format!(
                "broadcast {} counters do not add up",
                row.id
            )));
        }

        Ok(Self {
            id: BroadcastId::new(row.id),
            admin_telegram_id: TelegramId::new(row.admin_telegram_id),
            message: row.message,
            audience: row.target_audience,
            total_sent: row.total_sent,
            successful: row.successful,
            failed: row.failed,
            created_at: row.created_at,
            sent_at: row.sent_at,
        })
    }
}

/// Record a broadcast before sending it.
///
/// # Errors
///
/// Returns error if the database insert fails.
pub async fn create_broadcast(
    pool: &PgPool,
    admin_telegram_id: TelegramId,
    message: &str,
    audience: BroadcastAudience,
) -> Result<Broadcast, RepositoryError> {
    let row = sqlx::query_as::<_, BroadcastRow>(&format!(
        r"
        INSERT INTO broadcasts (admin_telegram_id, message, target_audience)
        VALUES ($1, $2, $3)
        RETURNING {BROADCAST_COLUMNS}
        "
    ))
    .bind(admin_telegram_id)
    .bind(message)
    .bind(audience)
    .fetch_one(pool)
    .await?;

    row.try_into()
}

/// Store the delivery counters and mark the broadcast sent.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the broadcast does not exist.
pub async fn finish_broadcast(
    pool: &PgPool,
    id: BroadcastId,
    report: BroadcastReport,
) -> Result<Broadcast, RepositoryError> {
    let row = sqlx::query_as::<_, BroadcastRow>(&format!(
        r"
        UPDATE broadcasts
        SET total_sent = $2, successful = $3, failed = $4, sent_at = NOW()
        WHERE id = $1
        RETURNING {BROADCAST_COLUMNS}
        "
    ))
    .bind(id)
    .bind(report.total)
    .bind(report.successful)
    .bind(report.failed)
    .fetch_optional(pool)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    row.try_into()
}

/// Most recent broadcasts first.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn list_recent_broadcasts(
    pool: &PgPool,
    limit: u32,
) -> Result<Vec<Broadcast>, RepositoryError> {
    let rows = sqlx::query_as::<_, BroadcastRow>(&format!(
        "SELECT {BROADCAST_COLUMNS} FROM broadcasts ORDER BY created_at DESC, id DESC LIMIT $1"
    ))
    .bind(to_i64(limit))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Telegram ids of everyone a broadcast to `audience` should reach.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn recipients(
    pool: &PgPool,
    audience: BroadcastAudience,
) -> Result<Vec<TelegramId>, RepositoryError> {
    let ids: Vec<i64> = sqlx::query_scalar(&format!(
        "SELECT u.telegram_id FROM users u WHERE {AUDIENCE_CLAUSE} ORDER BY u.id"
    ))
    .bind(audience)
    .bind(BroadcastAudience::ACTIVE_WINDOW_DAYS)
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().map(TelegramId::new).collect())
}

/// Number of users a broadcast to `audience` would reach.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn count_recipients(
    pool: &PgPool,
    audience: BroadcastAudience,
) -> Result<i64, RepositoryError> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM users u WHERE {AUDIENCE_CLAUSE}"
    ))
    .bind(audience)
    .bind(BroadcastAudience::ACTIVE_WINDOW_DAYS)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
