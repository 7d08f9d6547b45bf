//! Slash commands.

use tracing::info;

use studybot_core::{AdminRole, ProjectId};

use super::{Ctx, HandlerResult, Reply, admin, catalog};
use crate::db::{AdminRepository, UserRepository};
use crate::views;

/// Argument of `/start <code>`, the referral code of a deep link.
#[must_use]
pub fn start_payload(text: &str) -> Option<&str> {
    let (command, rest) = split_command(text)?;
    (command == "start")
        .then(|| rest.trim())
        .filter(|code| !code.is_empty())
}

/// `/name@bot args` → `("name", "args")`.
fn split_command(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('/')?;
    let (head, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let name = head.split_once('@').map_or(head, |(name, _)| name);
    Some((name, rest))
}

/// Id suffix of `/project_12` style commands.
fn id_suffix(name: &str, prefix: &str) -> Option<i32> {
    name.strip_prefix(prefix)?.parse().ok()
}

pub async fn handle(ctx: &Ctx<'_>, text: &str, is_new: bool) -> HandlerResult {
    let Some((name, _)) = split_command(text) else {
        return Ok(Reply::screen(views::menu::unknown_input(ctx.is_admin())));
    };

    match name {
        "start" => {
            ctx.clear_dialogue().await;
            let activity = UserRepository::new(ctx.pool()).activity(ctx.user.id).await?;
            Ok(Reply::screen(views::menu::welcome(
                &ctx.user,
                is_new,
                activity,
                ctx.is_admin(),
            )))
        }
        "menu" => {
            ctx.clear_dialogue().await;
            Ok(Reply::screen(views::menu::main_menu(ctx.is_admin())))
        }
        "help" => Ok(Reply::screen(views::menu::help())),
        "cancel" => {
            let screen = if ctx.clear_dialogue().await.is_some() {
                views::menu::cancelled(ctx.is_admin())
            } else {
                views::menu::main_menu(ctx.is_admin())
            };
            Ok(Reply::screen(screen))
        }
        "admin" => open_admin(ctx).await,
        _ => {
            if let Some(id) = id_suffix(name, "project_") {
                return catalog::card(ctx, ProjectId::new(id)).await;
            }
            if let Some(id) = id_suffix(name, "download_") {
                return catalog::download(ctx, ProjectId::new(id)).await;
            }
            Ok(Reply::screen(views::menu::unknown_input(ctx.is_admin())))
        }
    }
}

/// `/admin`: the panel for admins. Ids from `ADMIN_IDS` are written to the
/// `admins` table on first use so they show up in admin listings.
async fn open_admin(ctx: &Ctx<'_>) -> HandlerResult {
    let Some(role) = ctx.role else {
        return Ok(Reply::screen(views::menu::unknown_input(false)));
    };

    let telegram_id = ctx.user.telegram_id;
    if ctx.state.config().is_bootstrap_admin(telegram_id) {
        let admins = AdminRepository::new(ctx.pool());
        if admins.find(telegram_id).await?.is_none() {
            admins.grant(telegram_id, AdminRole::Admin).await?;
            info!(telegram_id = %telegram_id, "Bootstrap admin recorded");
        }
    }

    ctx.clear_dialogue().await;
    Ok(admin::home(role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_payload() {
        assert_eq!(start_payload("/start AB12CD34"), Some("AB12CD34"));
        assert_eq!(start_payload("/start@study_shop_bot AB12CD34"), Some("AB12CD34"));
        assert_eq!(start_payload("/start"), None);
        assert_eq!(start_payload("/menu AB12"), None);
        assert_eq!(start_payload("start AB12"), None);
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("/help"), Some(("help", "")));
        assert_eq!(split_command("/cancel@bot now"), Some(("cancel", "now")));
        assert_eq!(split_command("hello"), None);
    }

    #[test]
    fn test_id_suffix() {
        assert_eq!(id_suffix("project_12", "project_"), Some(12));
        assert_eq!(id_suffix("project_x", "project_"), None);
        assert_eq!(id_suffix("download_3", "project_"), None);
    }
}
