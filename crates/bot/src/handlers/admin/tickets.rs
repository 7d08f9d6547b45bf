//! Answering support tickets.

use tracing::{info, warn};

use studybot_core::{AdminSection, TicketId};

use crate::conversation::Dialogue;
use crate::conversation::input::required_text;
use crate::db::{TicketRepository, UserRepository};
use crate::error::AppError;
use crate::handlers::{Ctx, HandlerResult, Reply};
use crate::models::Ticket;
use crate::services::Notification;
use crate::views;

/// Open tickets listed at once, oldest first.
const OPEN_LIST_LIMIT: u32 = 20;

async fn render(ctx: &Ctx<'_>, ticket: &Ticket) -> Result<views::Screen, AppError> {
    let author = UserRepository::new(ctx.pool()).get_by_id(ticket.user_id).await?;
    Ok(views::admin::ticket(ticket, author.as_ref()))
}

async fn load(ctx: &Ctx<'_>, id: TicketId) -> Result<Ticket, AppError> {
    TicketRepository::new(ctx.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Ticket #{id}")))
}

pub async fn list(ctx: &Ctx<'_>) -> HandlerResult {
    ctx.require(AdminSection::Tickets)?;
    let repo = TicketRepository::new(ctx.pool());
    let tickets = repo.list_open(OPEN_LIST_LIMIT).await?;
    let open = repo.count_open().await?;
    Ok(Reply::screen(views::admin::tickets(&tickets, open)))
}

pub async fn view(ctx: &Ctx<'_>, id: TicketId) -> HandlerResult {
    ctx.require(AdminSection::Tickets)?;
    let ticket = load(ctx, id).await?;
    Ok(Reply::screen(render(ctx, &ticket).await?))
}

pub async fn start_reply(ctx: &Ctx<'_>, id: TicketId) -> HandlerResult {
    ctx.require(AdminSection::Tickets)?;
    let ticket = load(ctx, id).await?;
    if ticket.closed_at.is_some() {
        return Err(AppError::bad_request(format!("Ticket #{id} is closed.")));
    }
    ctx.set_dialogue(Dialogue::TicketReply { ticket_id: id }).await;
    Ok(Reply::screen(views::wizard::prompt(
        &format!(
            "💬 Reply to ticket #{id}\n\n<b>{}</b>\n{}\n\nSend your answer.",
            views::escape(&ticket.subject),
            views::escape(&views::truncate(&ticket.message, 500)),
        ),
        None,
    )))
}

/// Store the answer and send it to the ticket's author.
pub async fn reply_ticket(ctx: &Ctx<'_>, id: TicketId, text: &str) -> HandlerResult {
    ctx.require(AdminSection::Tickets)?;
    let answer = match required_text(text, "Answer", 1, 4000) {
        Ok(answer) => answer,
        Err(e) => {
            return Ok(Reply::screen(views::wizard::prompt(
                &format!("💬 Reply to ticket #{id}"),
                Some(&e.to_string()),
            )));
        }
    };

    let ticket = TicketRepository::new(ctx.pool()).respond(id, &answer).await?;
    ctx.clear_dialogue().await;
    info!(ticket_id = %id, "Ticket answered");

    let notifications = match UserRepository::new(ctx.pool()).get_by_id(ticket.user_id).await? {
        Some(author) => {
            let (text, keyboard) = views::admin::ticket_reply_notice(&ticket);
            vec![Notification::new(author.telegram_id.as_i64(), text).with_keyboard(keyboard)]
        }
        None => {
            warn!(ticket_id = %id, "Ticket author not found");
            Vec::new()
        }
    };
    Ok(Reply::screen(views::with_notice("✅ Answer sent.", render(ctx, &ticket).await?))
        .with_notifications(notifications))
}

pub async fn close(ctx: &Ctx<'_>, id: TicketId) -> HandlerResult {
    ctx.require(AdminSection::Tickets)?;
    let ticket = TicketRepository::new(ctx.pool()).close(id).await?;
    info!(ticket_id = %id, "Ticket closed");
    Ok(Reply::screen(render(ctx, &ticket).await?).with_toast("✅ Ticket closed"))
}
