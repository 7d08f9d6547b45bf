//! Support ticket repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use studybot_core::{OrderId, TicketId, TicketStatus, UserId};

use super::{RepositoryError, to_i64};
use crate::models::{NewTicket, Ticket};

const TICKET_COLUMNS: &str = "id, user_id, order_id, subject, message, status, admin_response, \
     created_at, updated_at, closed_at";

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i32,
    user_id: i32,
    order_id: Option<i32>,
    subject: String,
    message: String,
    status: TicketStatus,
    admin_response: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Self {
            id: TicketId::new(row.id),
            user_id: UserId::new(row.user_id),
            order_id: row.order_id.map(OrderId::new),
            subject: row.subject,
            message: row.message,
            status: row.status,
            admin_response: row.admin_response,
            created_at: row.created_at,
            updated_at: row.updated_at,
            closed_at: row.closed_at,
        }
    }
}

/// Repository for support tickets.
pub struct TicketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TicketRepository<'a> {
    /// Create a new ticket repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Open a ticket.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewTicket) -> Result<Ticket, RepositoryError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r"
            INSERT INTO support_tickets (user_id, order_id, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {TICKET_COLUMNS}
            "
        ))
        .bind(new.user_id)
        .bind(new.order_id)
        .bind(&new.subject)
        .bind(&new.message)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a ticket by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: TicketId) -> Result<Option<Ticket>, RepositoryError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// A user's tickets, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(to_i64(limit))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Tickets that are not closed, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_open(&self, limit: u32) -> Result<Vec<Ticket>, RepositoryError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets WHERE status <> 'closed' \
             ORDER BY created_at, id LIMIT $1"
        ))
        .bind(to_i64(limit))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count tickets that are not closed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_open(&self) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM support_tickets WHERE status <> 'closed'")
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Store an admin reply and mark the ticket answered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket does not exist, or
    /// `RepositoryError::Conflict` if it is already closed.
    pub async fn respond(&self, id: TicketId, response: &str) -> Result<Ticket, RepositoryError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r"
            UPDATE support_tickets
            SET admin_response = $2, status = 'in_progress', updated_at = NOW()
            WHERE id = $1 AND status <> 'closed'
            RETURNING {TICKET_COLUMNS}
            "
        ))
        .bind(id)
        .bind(response)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.missing_or_closed(id).await),
        }
    }

    /// Close a ticket.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket does not exist, or
    /// `RepositoryError::Conflict` if it is already closed.
    pub async fn close(&self, id: TicketId) -> Result<Ticket, RepositoryError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r"
            UPDATE support_tickets
            SET status = 'closed', closed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status <> 'closed'
            RETURNING {TICKET_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.missing_or_closed(id).await),
        }
    }

    async fn missing_or_closed(&self, id: TicketId) -> RepositoryError {
        match self.get(id).await {
            Ok(Some(_)) => RepositoryError::Conflict("ticket is already closed".to_string()),
            Ok(None) => RepositoryError::NotFound,
            Err(e) => e,
        }
    }
}
