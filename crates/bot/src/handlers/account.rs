//! The user's purchases, custom orders and profile.

use tracing::info;

use studybot_core::OrderId;

use super::{Ctx, HandlerResult, Reply};
use crate::conversation::{Dialogue, OrderWizard, ProfileField, StepError};
use crate::db::{OrderRepository, PurchaseRepository, UserRepository};
use crate::error::AppError;
use crate::models::{NewOrder, Order};
use crate::services;
use crate::telegram::OutgoingDocument;
use crate::views;

pub async fn purchases(ctx: &Ctx<'_>) -> HandlerResult {
    let owned = PurchaseRepository::new(ctx.pool())
        .list_by_user(ctx.user.id)
        .await?;
    Ok(Reply::screen(views::account::purchases(&owned)))
}

pub async fn orders(ctx: &Ctx<'_>) -> HandlerResult {
    let orders = OrderRepository::new(ctx.pool())
        .list_by_user(ctx.user.id)
        .await?;
    Ok(Reply::screen(views::account::orders(&orders)))
}

/// An order of the sender; other people's orders look missing.
async fn own_order(ctx: &Ctx<'_>, id: OrderId) -> Result<Order, AppError> {
    OrderRepository::new(ctx.pool())
        .get(id)
        .await?
        .filter(|order| order.user_id == ctx.user.id)
        .ok_or_else(|| AppError::not_found(format!("Order #{id}")))
}

pub async fn order(ctx: &Ctx<'_>, id: OrderId) -> HandlerResult {
    let order = own_order(ctx, id).await?;
    Ok(Reply::screen(views::account::order_card(&order)))
}

pub async fn pay(ctx: &Ctx<'_>, id: OrderId) -> HandlerResult {
    let order = own_order(ctx, id).await?;
    let paid = services::pay_order(ctx.pool(), ctx.state.gateway(), &order).await?;
    info!(order_id = %paid.id, user_id = %ctx.user.id, "Order paid");

    let price = paid.price.unwrap_or_default();
    let notifications = ctx
        .notify_admins(
            &format!("💰 Order #{} was paid: {price}", paid.id),
            Some(&views::admin::order_link(paid.id)),
        )
        .await?;
    Ok(Reply::screen(views::account::order_paid(&paid)).with_notifications(notifications))
}

pub async fn download_result(ctx: &Ctx<'_>, id: OrderId) -> HandlerResult {
    let order = own_order(ctx, id).await?;
    let path = order
        .result_file_path
        .as_deref()
        .filter(|_| order.result_available())
        .ok_or_else(|| AppError::bad_request("The result is not available yet."))?;

    let file = ctx.state.storage().read(path).await?;
    info!(order_id = %id, user_id = %ctx.user.id, "Order result sent");
    Ok(Reply::toast("📥 Sending the file…").with_document(OutgoingDocument {
        file_name: file.file_name,
        bytes: file.bytes,
        caption: Some(format!("📥 Order #{id}")),
    }))
}

pub async fn start_order(ctx: &Ctx<'_>) -> HandlerResult {
    let wizard = OrderWizard::new();
    let screen = views::wizard::order_step(&wizard, None);
    ctx.set_dialogue(Dialogue::CustomOrder(wizard)).await;
    Ok(Reply::screen(screen))
}

/// Keep the order wizard going after an answer.
pub async fn order_step(
    ctx: &Ctx<'_>,
    wizard: OrderWizard,
    error: Option<&StepError>,
) -> HandlerResult {
    let message = error.map(ToString::to_string);
    let screen = views::wizard::order_step(&wizard, message.as_deref());
    ctx.set_dialogue(Dialogue::CustomOrder(wizard)).await;
    Ok(Reply::screen(screen))
}

/// Store a finished custom order and tell the admins.
pub async fn submit_order(ctx: &Ctx<'_>, new: &NewOrder) -> HandlerResult {
    ctx.clear_dialogue().await;
    let order = OrderRepository::new(ctx.pool()).create(new).await?;
    info!(
        order_id = %order.id,
        user_id = %ctx.user.id,
        project_type = %order.project_type,
        "Custom order created"
    );

    let (text, keyboard) = views::admin::new_order_alert(&order, &ctx.user);
    let notifications = ctx.notify_admins(&text, Some(&keyboard)).await?;
    Ok(Reply::screen(views::account::order_created(&order)).with_notifications(notifications))
}

pub async fn profile(ctx: &Ctx<'_>) -> HandlerResult {
    let activity = UserRepository::new(ctx.pool()).activity(ctx.user.id).await?;
    Ok(Reply::screen(views::account::profile(&ctx.user, activity)))
}

pub async fn profile_stats(ctx: &Ctx<'_>) -> HandlerResult {
    let purchases = PurchaseRepository::new(ctx.pool());
    let spent = purchases.total_spent(ctx.user.id).await?;
    let activity = UserRepository::new(ctx.pool()).activity(ctx.user.id).await?;
    let statuses = OrderRepository::new(ctx.pool())
        .status_counts_for_user(ctx.user.id)
        .await?;
    Ok(Reply::screen(views::account::profile_stats(
        spent,
        activity.purchases,
        &statuses,
    )))
}

pub async fn referral(ctx: &Ctx<'_>) -> HandlerResult {
    let invited = UserRepository::new(ctx.pool())
        .referral_count(ctx.user.id)
        .await?;
    Ok(Reply::screen(views::account::referral(
        &ctx.user.referral_code,
        ctx.state.bot_username(),
        invited,
    )))
}

pub async fn start_profile_edit(ctx: &Ctx<'_>, field: ProfileField) -> HandlerResult {
    ctx.set_dialogue(Dialogue::EditProfile(field)).await;
    Ok(Reply::screen(views::account::profile_prompt(field, None)))
}

/// Validate and store a new profile value; a bad value asks again.
pub async fn save_profile(ctx: &Ctx<'_>, field: ProfileField, text: &str) -> HandlerResult {
    let update = match field.parse(text) {
        Ok(update) => update,
        Err(e) => {
            return Ok(Reply::screen(views::account::profile_prompt(
                field,
                Some(&e.to_string()),
            )));
        }
    };
    UserRepository::new(ctx.pool())
        .update_profile(ctx.user.id, &update)
        .await?;
    ctx.clear_dialogue().await;
    info!(user_id = %ctx.user.id, field = field.code(), "Profile updated");
    Ok(Reply::screen(views::account::profile_updated(field)))
}
