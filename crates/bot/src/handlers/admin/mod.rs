//! Admin panel handlers.
//!
//! Every entry point checks the sender's role against the section it
//! belongs to, so a role change takes effect on the next button press.

pub mod broadcasts;
pub mod categories;
pub mod orders;
pub mod projects;
pub mod tickets;
pub mod users;

use studybot_core::{AdminRole, AdminSection};

use super::{AdminAction, Ctx, HandlerResult, Reply};
use crate::conversation::OrderNoteKind;
use crate::db::stats;
use crate::error::AppError;
use crate::views;

/// The admin home screen for `role`.
#[must_use]
pub fn home(role: AdminRole) -> Reply {
    Reply::screen(views::admin::home(role))
}

pub async fn handle(ctx: &Ctx<'_>, action: AdminAction) -> HandlerResult {
    let Some(role) = ctx.role else {
        return Err(AppError::Forbidden("not an admin".to_string()));
    };

    match action {
        AdminAction::Home => {
            ctx.clear_dialogue().await;
            Ok(home(role))
        }
        AdminAction::Stats => {
            ctx.require(AdminSection::Stats)?;
            let stats = stats::dashboard(ctx.pool()).await?;
            Ok(Reply::screen(views::admin::dashboard(&stats)))
        }

        AdminAction::Projects { page } => projects::list(ctx, page).await,
        AdminAction::Project(id) => projects::view(ctx, id).await,
        AdminAction::EditProject { project_id, field } => {
            projects::start_edit(ctx, project_id, field).await
        }
        AdminAction::ToggleProject(id) => projects::toggle(ctx, id).await,
        AdminAction::DeleteProject(id) => projects::confirm_delete(ctx, id).await,
        AdminAction::ConfirmDeleteProject(id) => projects::delete(ctx, id).await,
        AdminAction::AttachFile(id) => projects::start_attach_file(ctx, id).await,
        AdminAction::NewProject => projects::start_new(ctx).await,

        AdminAction::OrdersMenu => {
            ctx.require(AdminSection::Orders)?;
            Ok(Reply::screen(views::admin::orders_menu()))
        }
        AdminAction::Orders { status, page } => orders::list(ctx, status, page).await,
        AdminAction::Order(id) => orders::view(ctx, id).await,
        AdminAction::SetStatus { order_id, status } => {
            orders::set_status(ctx, order_id, status).await
        }
        AdminAction::SetPrice(id) => orders::start_note(ctx, id, OrderNoteKind::Price).await,
        AdminAction::Comment(id) => orders::start_note(ctx, id, OrderNoteKind::Comment).await,
        AdminAction::UploadResult(id) => orders::start_upload(ctx, id).await,

        AdminAction::Broadcasts => {
            ctx.require(AdminSection::Broadcasts)?;
            Ok(Reply::screen(views::admin::broadcasts_menu()))
        }
        AdminAction::NewBroadcast => broadcasts::start(ctx).await,
        AdminAction::BroadcastHistory => broadcasts::history(ctx).await,

        AdminAction::Categories => categories::list(ctx).await,
        AdminAction::Category(id) => categories::view(ctx, id).await,
        AdminAction::NewCategory => categories::start_new(ctx).await,
        AdminAction::EditCategory { category_id, field } => {
            categories::start_edit(ctx, category_id, field).await
        }
        AdminAction::DeleteCategory(id) => categories::confirm_delete(ctx, id).await,
        AdminAction::ConfirmDeleteCategory(id) => categories::delete(ctx, id).await,

        AdminAction::Users { blocked_only, page } => users::list(ctx, blocked_only, page).await,
        AdminAction::User(id) => users::view(ctx, id).await,
        AdminAction::SetBlocked { user_id, blocked } => {
            users::set_blocked(ctx, user_id, blocked).await
        }
        AdminAction::SearchUsers => users::start_search(ctx).await,

        AdminAction::Tickets => tickets::list(ctx).await,
        AdminAction::Ticket(id) => tickets::view(ctx, id).await,
        AdminAction::ReplyTicket(id) => tickets::start_reply(ctx, id).await,
        AdminAction::CloseTicket(id) => tickets::close(ctx, id).await,
    }
}
