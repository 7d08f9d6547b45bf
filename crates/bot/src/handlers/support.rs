//! Support tickets from the user's side.

use tracing::info;

use studybot_core::{OrderId, TicketId};

use super::{Ctx, HandlerResult, Reply};
use crate::conversation::{Dialogue, StepError, TicketWizard};
use crate::db::{OrderRepository, TicketRepository};
use crate::error::AppError;
use crate::models::NewTicket;
use crate::views;

/// Tickets listed under "My tickets".
const TICKET_LIST_LIMIT: u32 = 20;

/// Open the ticket wizard, optionally about one of the sender's orders.
pub async fn start_ticket(ctx: &Ctx<'_>, order_id: Option<OrderId>) -> HandlerResult {
    let wizard = match order_id {
        Some(id) => {
            OrderRepository::new(ctx.pool())
                .get(id)
                .await?
                .filter(|order| order.user_id == ctx.user.id)
                .ok_or_else(|| AppError::not_found(format!("Order #{id}")))?;
            TicketWizard::about_order(id)
        }
        None => TicketWizard::new(None),
    };
    ticket_step(ctx, wizard, None).await
}

pub async fn ticket_step(
    ctx: &Ctx<'_>,
    wizard: TicketWizard,
    error: Option<&StepError>,
) -> HandlerResult {
    let message = error.map(ToString::to_string);
    let screen = views::wizard::ticket_step(&wizard, message.as_deref());
    ctx.set_dialogue(Dialogue::SupportTicket(wizard)).await;
    Ok(Reply::screen(screen))
}

/// Store a finished ticket and tell the admins.
pub async fn submit_ticket(ctx: &Ctx<'_>, new: &NewTicket) -> HandlerResult {
    ctx.clear_dialogue().await;
    let ticket = TicketRepository::new(ctx.pool()).create(new).await?;
    info!(ticket_id = %ticket.id, user_id = %ctx.user.id, "Ticket opened");

    let (text, keyboard) = views::admin::new_ticket_alert(&ticket, &ctx.user);
    let notifications = ctx.notify_admins(&text, Some(&keyboard)).await?;
    Ok(Reply::screen(views::support::ticket_created(&ticket)).with_notifications(notifications))
}

pub async fn tickets(ctx: &Ctx<'_>) -> HandlerResult {
    let tickets = TicketRepository::new(ctx.pool())
        .list_by_user(ctx.user.id, TICKET_LIST_LIMIT)
        .await?;
    Ok(Reply::screen(views::support::tickets(&tickets)))
}

pub async fn ticket(ctx: &Ctx<'_>, id: TicketId) -> HandlerResult {
    let ticket = TicketRepository::new(ctx.pool())
        .get(id)
        .await?
        .filter(|ticket| ticket.user_id == ctx.user.id)
        .ok_or_else(|| AppError::not_found(format!("Ticket #{id}")))?;
    Ok(Reply::screen(views::support::ticket_card(&ticket)))
}
