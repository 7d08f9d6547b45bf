//! User management: listing, search, and blocking.

use tracing::info;

use studybot_core::{AdminSection, UserId};

use crate::conversation::Dialogue;
use crate::db::{OrderRepository, UserFilter, UserRepository};
use crate::error::AppError;
use crate::handlers::{Ctx, HandlerResult, Reply};
use crate::views::{self, PAGE_SIZE, clamp_page, page_offset};

/// Matches shown for one search.
const SEARCH_LIMIT: u32 = 20;

pub async fn list(ctx: &Ctx<'_>, blocked_only: bool, page: u32) -> HandlerResult {
    ctx.require(AdminSection::Users)?;
    let filter = if blocked_only {
        UserFilter::Blocked
    } else {
        UserFilter::All
    };
    let repo = UserRepository::new(ctx.pool());
    let total = repo.count(filter).await?;
    let page = clamp_page(page, total);
    let users = repo.list(filter, PAGE_SIZE, page_offset(page)).await?;
    Ok(Reply::screen(views::admin::users(&users, blocked_only, page, total)))
}

pub async fn view(ctx: &Ctx<'_>, id: UserId) -> HandlerResult {
    ctx.require(AdminSection::Users)?;
    let repo = UserRepository::new(ctx.pool());
    let user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User #{id}")))?;
    let activity = repo.activity(id).await?;
    let orders = OrderRepository::new(ctx.pool()).list_by_user(id).await?;
    Ok(Reply::screen(views::admin::user(&user, activity, &orders)))
}

/// Block or unblock a user. Admins cannot block themselves.
pub async fn set_blocked(ctx: &Ctx<'_>, id: UserId, blocked: bool) -> HandlerResult {
    ctx.require(AdminSection::Users)?;
    if blocked && id == ctx.user.id {
        return Err(AppError::bad_request("You cannot block yourself."));
    }
    let user = UserRepository::new(ctx.pool()).set_blocked(id, blocked).await?;
    info!(user_id = %id, telegram_id = %user.telegram_id, blocked, "User block changed");

    let reply = view(ctx, id).await?;
    Ok(reply.with_toast(if blocked { "🚫 Blocked" } else { "✅ Unblocked" }))
}

pub async fn start_search(ctx: &Ctx<'_>) -> HandlerResult {
    ctx.require(AdminSection::Users)?;
    ctx.set_dialogue(Dialogue::UserSearch).await;
    Ok(Reply::screen(views::wizard::prompt(
        "🔍 Send a Telegram id, @username or name.",
        None,
    )))
}

pub async fn search(ctx: &Ctx<'_>, query: &str) -> HandlerResult {
    ctx.require(AdminSection::Users)?;
    ctx.clear_dialogue().await;
    let users = UserRepository::new(ctx.pool())
        .search(query, SEARCH_LIMIT)
        .await?;
    Ok(Reply::screen(views::admin::user_search_results(query.trim(), &users)))
}
