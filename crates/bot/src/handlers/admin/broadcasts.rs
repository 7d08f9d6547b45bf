//! Broadcasts: the compose wizard, launching a run in the background and
//! the history of past runs.

use tracing::{Instrument, error, info, info_span};

use studybot_core::{AdminSection, BroadcastAudience};

use crate::conversation::{BroadcastWizard, Dialogue, StepError};
use crate::db::broadcasts::{count_recipients, list_recent_broadcasts};
use crate::handlers::{Ctx, HandlerResult, Reply};
use crate::services::run_broadcast;
use crate::views;

/// Past broadcasts shown in the history.
const HISTORY_LIMIT: u32 = 10;

pub async fn start(ctx: &Ctx<'_>) -> HandlerResult {
    ctx.require(AdminSection::Broadcasts)?;
    step(ctx, BroadcastWizard::Message, None).await
}

pub async fn history(ctx: &Ctx<'_>) -> HandlerResult {
    ctx.require(AdminSection::Broadcasts)?;
    let broadcasts = list_recent_broadcasts(ctx.pool(), HISTORY_LIMIT).await?;
    Ok(Reply::screen(views::admin::broadcast_history(&broadcasts)))
}

/// Keep the compose wizard going; the confirm step shows the audience size.
pub async fn step(
    ctx: &Ctx<'_>,
    wizard: BroadcastWizard,
    error: Option<&StepError>,
) -> HandlerResult {
    ctx.require(AdminSection::Broadcasts)?;
    let recipients = match &wizard {
        BroadcastWizard::Confirm { audience, .. } => count_recipients(ctx.pool(), *audience).await?,
        _ => 0,
    };
    let message = error.map(ToString::to_string);
    let screen = views::wizard::broadcast_step(&wizard, recipients, message.as_deref());
    ctx.set_dialogue(Dialogue::Broadcast(wizard)).await;
    Ok(Reply::screen(screen))
}

/// Start sending in the background and report back to the admin's chat
/// when the run is over.
pub async fn launch(ctx: &Ctx<'_>, message: &str, audience: BroadcastAudience) -> HandlerResult {
    ctx.require(AdminSection::Broadcasts)?;
    ctx.clear_dialogue().await;
    let recipients = count_recipients(ctx.pool(), audience).await?;

    let state = ctx.state.clone();
    let admin_telegram_id = ctx.user.telegram_id;
    let admin_chat = ctx.chat_id;
    let text = message.to_string();
    let span = info_span!("broadcast", admin = %admin_telegram_id, audience = %audience);

    tokio::spawn(
        async move {
            let delay = state.config().broadcast_delay;
            match run_broadcast(
                state.pool(),
                state.messenger(),
                admin_telegram_id,
                &text,
                audience,
                delay,
            )
            .await
            {
                Ok(broadcast) => {
                    let report = views::admin::broadcast_report(&broadcast);
                    if let Err(e) = state.messenger().send_text(admin_chat, &report, None).await {
                        error!(error = %e, "Broadcast report not delivered");
                    }
                }
                Err(e) => {
                    sentry::capture_error(&e);
                    error!(error = %e, "Broadcast failed");
                }
            }
        }
        .instrument(span),
    );

    info!(audience = %audience, recipients, "Broadcast launched");
    Ok(Reply::screen(views::admin::broadcast_started(recipients)))
}
