//! Custom order processing: status changes, quotes, comments and results.
//!
//! Every change the customer should know about produces a notification to
//! the customer's chat.

use tracing::{info, warn};

use studybot_core::{AdminSection, OrderId, OrderStatus};

use crate::conversation::input::{positive_price, required_text};
use crate::conversation::{Dialogue, OrderNoteKind};
use crate::db::{OrderRepository, UserRepository};
use crate::error::AppError;
use crate::handlers::{Ctx, HandlerResult, Reply};
use crate::models::Order;
use crate::services::Notification;
use crate::services::storage::MAX_FILE_BYTES;
use crate::telegram::{Document, Keyboard};
use crate::views::{self, PAGE_SIZE, clamp_page, page_offset};

async fn load(ctx: &Ctx<'_>, id: OrderId) -> Result<Order, AppError> {
    OrderRepository::new(ctx.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order #{id}")))
}

/// The admin card of `order` with its customer.
async fn render(ctx: &Ctx<'_>, order: &Order) -> Result<views::Screen, AppError> {
    let customer = UserRepository::new(ctx.pool()).get_by_id(order.user_id).await?;
    Ok(views::admin::order(order, customer.as_ref()))
}

/// A message for the order's customer, or nothing if the account is gone.
async fn notify_customer(
    ctx: &Ctx<'_>,
    order: &Order,
    (text, keyboard): (String, Keyboard),
) -> Result<Vec<Notification>, AppError> {
    let Some(customer) = UserRepository::new(ctx.pool()).get_by_id(order.user_id).await? else {
        warn!(order_id = %order.id, "Order customer not found");
        return Ok(Vec::new());
    };
    Ok(vec![
        Notification::new(customer.telegram_id.as_i64(), text).with_keyboard(keyboard),
    ])
}

pub async fn list(ctx: &Ctx<'_>, status: Option<OrderStatus>, page: u32) -> HandlerResult {
    ctx.require(AdminSection::Orders)?;
    let repo = OrderRepository::new(ctx.pool());
    let total = repo.count(status).await?;
    let page = clamp_page(page, total);
    let orders = repo.list(status, PAGE_SIZE, page_offset(page)).await?;
    Ok(Reply::screen(views::admin::orders(status, &orders, page, total)))
}

pub async fn view(ctx: &Ctx<'_>, id: OrderId) -> HandlerResult {
    ctx.require(AdminSection::Orders)?;
    let order = load(ctx, id).await?;
    Ok(Reply::screen(render(ctx, &order).await?))
}

/// Move an order along its lifecycle. Rejecting first asks for a reason.
pub async fn set_status(ctx: &Ctx<'_>, id: OrderId, status: OrderStatus) -> HandlerResult {
    ctx.require(AdminSection::Orders)?;
    if status == OrderStatus::Rejected {
        let order = load(ctx, id).await?;
        if !order.status.can_transition_to(status) {
            return Err(AppError::bad_request(format!(
                "Order #{id} can no longer be rejected."
            )));
        }
        return start_note(ctx, id, OrderNoteKind::Rejection).await;
    }

    let order = OrderRepository::new(ctx.pool())
        .transition(id, status, None)
        .await?;
    info!(order_id = %id, status = %status, "Order status changed");

    let notifications = notify_customer(ctx, &order, views::admin::order_status_notice(&order)).await?;
    Ok(Reply::screen(render(ctx, &order).await?)
        .with_toast(format!("{} {}", status.emoji(), status.label()))
        .with_notifications(notifications))
}

pub async fn start_note(ctx: &Ctx<'_>, id: OrderId, kind: OrderNoteKind) -> HandlerResult {
    ctx.require(AdminSection::Orders)?;
    let order = load(ctx, id).await?;
    if kind != OrderNoteKind::Rejection && !order.status.is_open() {
        return Err(AppError::bad_request(format!("Order #{id} is already closed.")));
    }
    ctx.set_dialogue(Dialogue::OrderNote { order_id: id, kind }).await;
    Ok(Reply::screen(views::wizard::prompt(
        &format!("✍️ <b>Order #{id}</b>\n\n{}", kind.prompt()),
        None,
    )))
}

/// Store a typed price, comment or rejection reason.
pub async fn save_note(
    ctx: &Ctx<'_>,
    id: OrderId,
    kind: OrderNoteKind,
    text: &str,
) -> HandlerResult {
    ctx.require(AdminSection::Orders)?;
    let repo = OrderRepository::new(ctx.pool());

    let retry = |error: String| -> HandlerResult {
        Ok(Reply::screen(views::wizard::prompt(
            &format!("✍️ <b>Order #{id}</b>\n\n{}", kind.prompt()),
            Some(&error),
        )))
    };

    let (order, notice) = match kind {
        OrderNoteKind::Price => {
            let price = match positive_price(text) {
                Ok(price) => price,
                Err(e) => return retry(e.to_string()),
            };
            let order = repo.set_price(id, price).await?;
            let notice = views::admin::order_update_notice(
                &order,
                &format!("the price is <b>{price}</b>."),
            );
            (order, notice)
        }
        OrderNoteKind::Comment => {
            let comment = match required_text(text, "Comment", 1, 2000) {
                Ok(comment) => comment,
                Err(e) => return retry(e.to_string()),
            };
            let order = repo.set_comment(id, &comment).await?;
            let notice = views::admin::order_update_notice(
                &order,
                &format!("new comment from the team:\n\n{}", views::escape(&comment)),
            );
            (order, notice)
        }
        OrderNoteKind::Rejection => {
            let reason = match required_text(text, "Reason", 3, 1000) {
                Ok(reason) => reason,
                Err(e) => return retry(e.to_string()),
            };
            let order = repo
                .transition(id, OrderStatus::Rejected, Some(&reason))
                .await?;
            let notice = views::admin::order_status_notice(&order);
            (order, notice)
        }
    };

    ctx.clear_dialogue().await;
    info!(order_id = %id, note = ?kind, "Order updated");
    let notifications = notify_customer(ctx, &order, notice).await?;
    Ok(Reply::screen(views::with_notice("✅ Saved.", render(ctx, &order).await?))
        .with_notifications(notifications))
}

pub async fn start_upload(ctx: &Ctx<'_>, id: OrderId) -> HandlerResult {
    ctx.require(AdminSection::Orders)?;
    let order = load(ctx, id).await?;
    if order.status == OrderStatus::Rejected {
        return Err(AppError::bad_request(format!("Order #{id} was rejected.")));
    }
    ctx.set_dialogue(Dialogue::OrderResult { order_id: id }).await;
    Ok(Reply::screen(views::wizard::prompt(
        &format!("📎 Send the finished work for order #{id} as a document (up to 20 MB)."),
        None,
    )))
}

/// Store the uploaded result and tell the customer it is ready.
pub async fn attach_result(ctx: &Ctx<'_>, id: OrderId, document: &Document) -> HandlerResult {
    ctx.require(AdminSection::Orders)?;
    if document.file_size.is_some_and(|size| size > MAX_FILE_BYTES) {
        return Err(AppError::bad_request("The file is larger than 20 MB."));
    }
    let order = load(ctx, id).await?;

    let bytes = ctx.state.messenger().download_document(&document.file_id).await?;
    let name = document.file_name.as_deref().unwrap_or("result.zip");
    let path = ctx
        .state
        .storage()
        .save_order_result(order.id, name, &bytes)
        .await?;
    let order = OrderRepository::new(ctx.pool())
        .set_result_file(id, &path)
        .await?;
    ctx.clear_dialogue().await;
    info!(order_id = %id, path = %path, size = bytes.len(), "Order result attached");

    let notice = views::admin::order_update_notice(
        &order,
        "the finished work has been uploaded. It can be downloaded once the order is paid and completed.",
    );
    let notifications = notify_customer(ctx, &order, notice).await?;
    Ok(Reply::fresh(views::with_notice(
        "✅ Result attached.",
        render(ctx, &order).await?,
    ))
    .with_notifications(notifications))
}
