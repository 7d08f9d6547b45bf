//! Custom orders and catalog purchases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studybot_core::{OrderId, OrderStatus, Price, ProjectId, ProjectType, PurchaseId, UserId};

/// A bespoke work request submitted through the order wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub project_type: ProjectType,
    pub description: String,
    pub technologies: Option<String>,
    /// Free-form, as typed by the user ("by 15 May").
    pub deadline: Option<String>,
    /// Free-form, as typed by the user.
    pub budget: Option<String>,
    pub contact_info: Option<String>,
    /// Finished work uploaded by an admin, relative to the uploads directory.
    pub result_file_path: Option<String>,
    pub status: OrderStatus,
    /// Price quoted by an admin.
    pub price: Option<Price>,
    pub is_paid: bool,
    pub admin_comment: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// The customer can pay once a price is quoted and the order is still alive.
    #[must_use]
    pub fn awaiting_payment(&self) -> bool {
        self.price.is_some_and(|p| !p.is_zero())
            && !self.is_paid
            && !matches!(self.status, OrderStatus::New | OrderStatus::Rejected)
    }

    /// The result can be downloaded once it is uploaded and paid for.
    #[must_use]
    pub fn result_available(&self) -> bool {
        self.result_file_path.is_some() && (self.is_paid || self.price.is_none_or(|p| p.is_zero()))
    }
}

/// Input for creating a custom order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub project_type: ProjectType,
    pub description: String,
    pub technologies: Option<String>,
    pub deadline: Option<String>,
    pub budget: Option<String>,
    pub contact_info: Option<String>,
}

/// Number of a user's orders in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// A completed catalog purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    /// Price paid at the time of purchase.
    pub price: Price,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A purchase joined with the title of the project bought.
#[derive(Debug, Clone)]
pub struct OwnedProject {
    pub purchase: Purchase,
    pub title: String,
    pub has_file: bool,
}

/// Input for recording a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchase {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub price: Price,
    pub payment_method: String,
    pub transaction_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn order(status: OrderStatus, price: Option<i64>, is_paid: bool) -> Order {
        Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            project_type: ProjectType::Coursework,
            description: "Inventory system in Django".to_string(),
            technologies: None,
            deadline: None,
            budget: None,
            contact_info: None,
            result_file_path: None,
            status,
            price: price.map(|p| Price::from_amount(Decimal::from(p))),
            is_paid,
            admin_comment: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_awaiting_payment() {
        assert!(order(OrderStatus::Accepted, Some(15000), false).awaiting_payment());
        assert!(!order(OrderStatus::Accepted, Some(15000), true).awaiting_payment());
        assert!(!order(OrderStatus::Accepted, None, false).awaiting_payment());
        assert!(!order(OrderStatus::New, Some(15000), false).awaiting_payment());
        assert!(!order(OrderStatus::Rejected, Some(15000), false).awaiting_payment());
    }

    #[test]
    fn test_result_available_requires_payment() {
        let mut o = order(OrderStatus::Completed, Some(15000), false);
        o.result_file_path = Some("orders/1/report.pdf".to_string());
        assert!(!o.result_available());
        o.is_paid = true;
        assert!(o.result_available());
    }
}
