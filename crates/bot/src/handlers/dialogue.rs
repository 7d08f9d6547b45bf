//! Answers to the open dialogue: typed text, uploaded documents and the
//! wizard buttons (pick, skip, confirm, cancel).

use tracing::debug;

use super::{Callback, Ctx, HandlerResult, Reply, account, admin, catalog, support};
use crate::conversation::{BroadcastWizard, Dialogue, StepError};
use crate::telegram::Document;
use crate::views;

fn unknown(ctx: &Ctx<'_>) -> Reply {
    Reply::screen(views::menu::unknown_input(ctx.is_admin()))
}

/// A button from an earlier step of the form.
fn stale() -> Reply {
    Reply::toast("Please answer the question above.")
}

/// The open dialogue, dropped if it needs admin rights the sender lost.
async fn current(ctx: &Ctx<'_>) -> Option<Dialogue> {
    let dialogue = ctx.dialogue().await?;
    if dialogue.is_admin() && !ctx.is_admin() {
        debug!(dialogue = dialogue.name(), "Admin dialogue dropped");
        ctx.clear_dialogue().await;
        return None;
    }
    Some(dialogue)
}

pub async fn on_text(ctx: &Ctx<'_>, text: &str) -> HandlerResult {
    let Some(dialogue) = current(ctx).await else {
        return Ok(unknown(ctx));
    };
    debug!(dialogue = dialogue.name(), "Dialogue answer");

    match dialogue {
        Dialogue::CustomOrder(mut wizard) => {
            let error = wizard.apply_text(text).err();
            account::order_step(ctx, wizard, error.as_ref()).await
        }
        Dialogue::SupportTicket(mut wizard) => match wizard.apply_text(text, ctx.user.id) {
            Ok(Some(ticket)) => support::submit_ticket(ctx, &ticket).await,
            Ok(None) => support::ticket_step(ctx, wizard, None).await,
            Err(e) => support::ticket_step(ctx, wizard, Some(&e)).await,
        },
        Dialogue::EditProfile(field) => account::save_profile(ctx, field, text).await,
        Dialogue::Review(wizard) => match wizard.apply_text(text, ctx.user.id) {
            Ok(review) => catalog::save_review(ctx, &review).await,
            Err(e) => catalog::review_step(ctx, wizard, Some(&e)).await,
        },
        Dialogue::CatalogSearch => catalog::search(ctx, text).await,

        Dialogue::NewProject(mut wizard) => {
            let error = wizard.apply_text(text).err();
            admin::projects::project_step(ctx, wizard, error.as_ref()).await
        }
        Dialogue::EditProject { project_id, field } => {
            admin::projects::save_project_field(ctx, project_id, field, text).await
        }
        Dialogue::ProjectFile { .. } | Dialogue::OrderResult { .. } => Ok(Reply::screen(
            views::wizard::prompt(
                "📎 Send the file as a document.",
                Some(&StepError::ExpectedDocument.to_string()),
            ),
        )),
        Dialogue::NewCategory(mut wizard) => {
            let error = wizard.apply_text(text).err();
            admin::categories::category_step(ctx, wizard, error.as_ref()).await
        }
        Dialogue::EditCategory { category_id, field } => {
            admin::categories::save_category_field(ctx, category_id, field, text).await
        }
        Dialogue::Broadcast(mut wizard) => {
            let error = wizard.apply_text(text).err();
            admin::broadcasts::step(ctx, wizard, error.as_ref()).await
        }
        Dialogue::OrderNote { order_id, kind } => {
            admin::orders::save_note(ctx, order_id, kind, text).await
        }
        Dialogue::TicketReply { ticket_id } => admin::tickets::reply_ticket(ctx, ticket_id, text).await,
        Dialogue::UserSearch => admin::users::search(ctx, text).await,
    }
}

pub async fn on_document(ctx: &Ctx<'_>, document: &Document) -> HandlerResult {
    match current(ctx).await {
        Some(Dialogue::ProjectFile { project_id }) => {
            admin::projects::attach_file(ctx, project_id, document).await
        }
        Some(Dialogue::OrderResult { order_id }) => {
            admin::orders::attach_result(ctx, order_id, document).await
        }
        _ => Ok(unknown(ctx)),
    }
}

pub async fn on_button(ctx: &Ctx<'_>, callback: Callback) -> HandlerResult {
    if callback == Callback::Cancel {
        if let Some(dialogue) = ctx.clear_dialogue().await {
            debug!(dialogue = dialogue.name(), "Dialogue cancelled");
        }
        return Ok(Reply::screen(views::menu::cancelled(ctx.is_admin())));
    }

    let Some(dialogue) = current(ctx).await else {
        return Ok(Reply::screen(views::menu::main_menu(ctx.is_admin()))
            .with_toast("This form has expired."));
    };

    match (dialogue, callback) {
        (Dialogue::CustomOrder(mut wizard), Callback::PickType(kind)) => {
            let error = wizard.pick_type(kind).err();
            account::order_step(ctx, wizard, error.as_ref()).await
        }
        (Dialogue::CustomOrder(mut wizard), Callback::Skip) => {
            let error = wizard.skip().err();
            account::order_step(ctx, wizard, error.as_ref()).await
        }
        (Dialogue::CustomOrder(wizard), Callback::Confirm) => {
            match wizard.to_new_order(ctx.user.id) {
                Some(order) => account::submit_order(ctx, &order).await,
                None => Ok(stale()),
            }
        }

        (Dialogue::Review(mut wizard), Callback::PickRating(rating)) => {
            let error = wizard.pick_rating(rating).err();
            catalog::review_step(ctx, wizard, error.as_ref()).await
        }
        (Dialogue::Review(wizard), Callback::Skip) => match wizard.skip(ctx.user.id) {
            Ok(review) => catalog::save_review(ctx, &review).await,
            Err(e) => catalog::review_step(ctx, wizard, Some(&e)).await,
        },

        (Dialogue::NewProject(mut wizard), Callback::PickCategory(id)) => {
            let error = wizard.pick_category(id).err();
            admin::projects::project_step(ctx, wizard, error.as_ref()).await
        }
        (Dialogue::NewProject(mut wizard), Callback::PickType(kind)) => {
            let error = wizard.pick_type(kind).err();
            admin::projects::project_step(ctx, wizard, error.as_ref()).await
        }
        (Dialogue::NewProject(mut wizard), Callback::PickLevel(level)) => {
            let error = wizard.pick_level(level).err();
            admin::projects::project_step(ctx, wizard, error.as_ref()).await
        }
        (Dialogue::NewProject(mut wizard), Callback::Skip) => {
            let error = wizard.skip().err();
            admin::projects::project_step(ctx, wizard, error.as_ref()).await
        }
        (Dialogue::NewProject(wizard), Callback::Confirm) => match wizard.to_new_project() {
            Some(project) => admin::projects::create_project(ctx, &project).await,
            None => Ok(stale()),
        },

        (Dialogue::NewCategory(mut wizard), Callback::Skip) => {
            let error = wizard.skip().err();
            admin::categories::category_step(ctx, wizard, error.as_ref()).await
        }
        (Dialogue::NewCategory(wizard), Callback::Confirm) => match wizard.to_new_category() {
            Some(category) => admin::categories::create_category(ctx, &category).await,
            None => Ok(stale()),
        },

        (Dialogue::Broadcast(mut wizard), Callback::PickAudience(audience)) => {
            let error = wizard.pick_audience(audience).err();
            admin::broadcasts::step(ctx, wizard, error.as_ref()).await
        }
        (Dialogue::Broadcast(BroadcastWizard::Confirm { message, audience }), Callback::Confirm) => {
            admin::broadcasts::launch(ctx, &message, audience).await
        }

        (dialogue, _) => {
            debug!(dialogue = dialogue.name(), button = %callback, "Button does not fit the step");
            Ok(stale())
        }
    }
}
