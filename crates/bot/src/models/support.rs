//! Support tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studybot_core::{OrderId, TicketId, TicketStatus, UserId};

/// A question or complaint sent to the support team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: UserId,
    /// Set when the ticket was opened from an order's detail view.
    pub order_id: Option<OrderId>,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    /// Latest reply from an admin.
    pub admin_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Input for opening a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub user_id: UserId,
    pub order_id: Option<OrderId>,
    pub subject: String,
    pub message: String,
}
