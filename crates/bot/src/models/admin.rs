//! Admin-side records: broadcasts and dashboard statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use studybot_core::{BroadcastAudience, BroadcastId, TelegramId};

/// A mass notification and its delivery counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: BroadcastId,
    pub admin_telegram_id: TelegramId,
    pub message: String,
    pub audience: BroadcastAudience,
    pub total_sent: i32,
    pub successful: i32,
    pub failed: i32,
    pub created_at: DateTime<Utc>,
    /// Set once the send loop has finished.
    pub sent_at: Option<DateTime<Utc>>,
}

/// Outcome of one broadcast run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub total: i32,
    pub successful: i32,
    pub failed: i32,
}

impl BroadcastReport {
    pub const fn record(&mut self, delivered: bool) {
        self.total += 1;
        if delivered {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Numbers shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: i64,
    pub new_users_week: i64,
    pub blocked_users: i64,
    pub active_projects: i64,
    pub categories: i64,
    pub new_orders: i64,
    pub orders_in_work: i64,
    pub completed_orders: i64,
    pub purchases: i64,
    pub revenue: Decimal,
    pub open_tickets: i64,
}
