//! Checkout: stub payment gateway and idempotent purchase recording.
//!
//! No real money moves. [`StubGateway`] approves every charge and hands out
//! a `test-<uuid>` transaction id; the purchases themselves are recorded for
//! real, in one transaction per checkout.

use std::collections::HashSet;

use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use studybot_core::{Price, ProjectId, UserId};

use crate::db::purchases::{owned_project_ids, record_purchase};
use crate::db::{CartRepository, OrderRepository, ProjectRepository, RepositoryError};
use crate::error::AppError;
use crate::models::{Cart, CartLine, NewPurchase, Order};

/// Payment method recorded for stub payments.
pub const STUB_PAYMENT_METHOD: &str = "test";

/// Proof of an approved charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub payment_method: String,
    pub transaction_id: String,
}

/// Payment gateway that approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubGateway;

impl StubGateway {
    /// Approve a charge of `amount`.
    #[must_use]
    pub fn charge(&self, amount: Price) -> PaymentReceipt {
        let receipt = PaymentReceipt {
            payment_method: STUB_PAYMENT_METHOD.to_string(),
            transaction_id: format!("test-{}", Uuid::new_v4()),
        };
        info!(%amount, transaction_id = %receipt.transaction_id, "Stub payment approved");
        receipt
    }
}

/// A project bought during checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasedItem {
    pub project_id: ProjectId,
    pub title: String,
    pub price: Price,
}

/// Result of checking out a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutOutcome {
    pub purchased: Vec<PurchasedItem>,
    /// Titles skipped because the user already owned them.
    pub already_owned: Vec<String>,
    /// Lines left out because the project was deactivated.
    pub unavailable: Vec<String>,
}

impl CheckoutOutcome {
    /// Total charged for the newly purchased items.
    #[must_use]
    pub fn total(&self) -> Price {
        self.purchased.iter().map(|item| item.price).sum()
    }
}

/// Buy every available project in the user's cart and empty the cart.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if nothing in the cart can be bought, or a
/// database error if the transaction fails (nothing is recorded then).
#[instrument(skip(pool, gateway), fields(user_id = %user_id))]
pub async fn checkout_cart(
    pool: &PgPool,
    gateway: &StubGateway,
    user_id: UserId,
) -> Result<CheckoutOutcome, AppError> {
    let cart = CartRepository::new(pool).get(user_id).await?;
    if cart.available().next().is_none() {
        return Err(AppError::bad_request("Your cart is empty."));
    }

    let mut tx = pool.begin().await.map_err(RepositoryError::from)?;
    let owned = owned_project_ids(&mut tx, user_id).await?;
    let (to_buy, mut outcome) = split_cart(&cart, &owned);

    if !to_buy.is_empty() {
        let receipt = gateway.charge(to_buy.iter().copied().map(CartLine::effective_price).sum());

        for line in to_buy {
            let purchase = record_purchase(
                &mut tx,
                &NewPurchase {
                    user_id,
                    project_id: line.project_id,
                    price: line.effective_price(),
                    payment_method: receipt.payment_method.clone(),
                    transaction_id: Some(receipt.transaction_id.clone()),
                },
            )
            .await?;

            match purchase {
                Some(purchase) => outcome.purchased.push(PurchasedItem {
                    project_id: purchase.project_id,
                    title: line.title.clone(),
                    price: purchase.price,
                }),
                None => outcome.already_owned.push(line.title.clone()),
            }
        }
    }

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

    tx.commit().await.map_err(RepositoryError::from)?;

    info!(
        purchased = outcome.purchased.len(),
        already_owned = outcome.already_owned.len(),
        "Checkout complete"
    );
    Ok(outcome)
}

/// Split the cart into the lines to pay for and an outcome that already
/// lists the skipped ones.
fn split_cart<'c>(
    cart: &'c Cart,
    owned: &HashSet<ProjectId>,
) -> (Vec<&'c CartLine>, CheckoutOutcome) {
    let mut outcome = CheckoutOutcome::default();
    let mut to_buy = Vec::new();
    for line in &cart.lines {
        if !line.is_active {
            outcome.unavailable.push(line.title.clone());
        } else if owned.contains(&line.project_id) {
            outcome.already_owned.push(line.title.clone());
        } else {
            to_buy.push(line);
        }
    }
    (to_buy, outcome)
}

/// Buy a single project straight from its card.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the project does not exist or is hidden,
/// and `AppError::BadRequest` if the user already owns it.
#[instrument(skip(pool, gateway), fields(user_id = %user_id, project_id = %project_id))]
pub async fn buy_now(
    pool: &PgPool,
    gateway: &StubGateway,
    user_id: UserId,
    project_id: ProjectId,
) -> Result<PurchasedItem, AppError> {
    let project = ProjectRepository::new(pool)
        .get(project_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::not_found("Project"))?;

    let price = project.effective_price();
    let receipt = gateway.charge(price);

    let mut tx = pool.begin().await.map_err(RepositoryError::from)?;
    let purchase = record_purchase(
        &mut tx,
        &NewPurchase {
            user_id,
            project_id,
            price,
            payment_method: receipt.payment_method,
            transaction_id: Some(receipt.transaction_id),
        },
    )
    .await?;
    tx.commit().await.map_err(RepositoryError::from)?;

    let purchase = purchase.ok_or_else(|| AppError::bad_request("You already own this project."))?;

    Ok(PurchasedItem {
        project_id,
        title: project.title,
        price: purchase.price,
    })
}

/// Pay the quoted price of a custom order.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the order has no price yet, was
/// rejected, or is already paid.
#[instrument(skip(pool, gateway, order), fields(order_id = %order.id))]
pub async fn pay_order(
    pool: &PgPool,
    gateway: &StubGateway,
    order: &Order,
) -> Result<Order, AppError> {
    if !order.awaiting_payment() {
        return Err(AppError::bad_request("This order is not awaiting payment."));
    }
    let Some(price) = order.price else {
        return Err(AppError::bad_request("This order has no price yet."));
    };

    gateway.charge(price);

    OrderRepository::new(pool)
        .mark_paid(order.id)
        .await?
        .ok_or_else(|| AppError::bad_request("This order is already paid."))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use studybot_core::CartItemId;

    use super::*;

    fn line(id: i32, amount: i64, discount: Option<i64>, is_active: bool) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            project_id: ProjectId::new(id),
            title: format!("Project {id}"),
            price: Price::from_amount(Decimal::from(amount)),
            discount_price: discount.map(|d| Price::from_amount(Decimal::from(d))),
            is_active,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_split_cart_charges_only_new_lines() {
        let cart = Cart {
            lines: vec![
                line(1, 8_000, Some(6_500), true),
                line(2, 3_000, None, true),
                line(3, 5_000, None, false),
            ],
        };
        let owned = HashSet::from([ProjectId::new(2)]);

        let (to_buy, outcome) = split_cart(&cart, &owned);

        let ids: Vec<_> = to_buy.iter().map(|l| l.project_id).collect();
        assert_eq!(ids, vec![ProjectId::new(1)]);
        let charged: Price = to_buy.iter().copied().map(CartLine::effective_price).sum();
        assert_eq!(charged, Price::from_amount(Decimal::from(6_500)));
        assert!(charged.amount < cart.total().amount);
        assert_eq!(outcome.already_owned, vec!["Project 2".to_string()]);
        assert_eq!(outcome.unavailable, vec!["Project 3".to_string()]);
        assert!(outcome.purchased.is_empty());
    }

    #[test]
    fn test_split_cart_with_everything_owned() {
        let cart = Cart {
            lines: vec![line(1, 4_000, None, true)],
        };
        let owned = HashSet::from([ProjectId::new(1)]);

        let (to_buy, outcome) = split_cart(&cart, &owned);

        assert!(to_buy.is_empty());
        assert_eq!(outcome.already_owned, vec!["Project 1".to_string()]);
    }

    #[test]
    fn test_stub_gateway_receipt() {
        let receipt = StubGateway.charge(Price::from_amount(Decimal::from(15_000)));
        assert_eq!(receipt.payment_method, "test");
        assert!(receipt.transaction_id.starts_with("test-"));
        assert_eq!(receipt.transaction_id.len(), "test-".len() + 36);
    }

    #[test]
    fn test_outcome_total() {
        let outcome = CheckoutOutcome {
            purchased: vec![
                PurchasedItem {
                    project_id: ProjectId::new(1),
                    title: "Library system".to_string(),
                    price: Price::from_amount(Decimal::from(6_000)),
                },
                PurchasedItem {
                    project_id: ProjectId::new(2),
                    title: "Chat server".to_string(),
                    price: Price::from_amount(Decimal::from(12_000)),
                },
            ],
            ..CheckoutOutcome::default()
        };
        assert_eq!(outcome.total(), Price::from_amount(Decimal::from(18_000)));
    }
}
