//! Category management.

use tracing::info;

use studybot_core::{AdminSection, CategoryId};

use crate::conversation::{CategoryField, CategoryWizard, Dialogue, StepError};
use crate::db::CategoryRepository;
use crate::error::AppError;
use crate::handlers::{Ctx, HandlerResult, Reply};
use crate::models::{CategorySummary, NewCategory};
use crate::views;

/// A category with the number of projects filed under it, hidden ones included.
async fn summary(ctx: &Ctx<'_>, id: CategoryId) -> Result<CategorySummary, AppError> {
    CategoryRepository::new(ctx.pool())
        .list_with_counts(false)
        .await?
        .into_iter()
        .find(|summary| summary.category.id == id)
        .ok_or_else(|| AppError::not_found(format!("Category #{id}")))
}

pub async fn list(ctx: &Ctx<'_>) -> HandlerResult {
    ctx.require(AdminSection::Categories)?;
    let categories = CategoryRepository::new(ctx.pool())
        .list_with_counts(false)
        .await?;
    Ok(Reply::screen(views::admin::categories(&categories)))
}

pub async fn view(ctx: &Ctx<'_>, id: CategoryId) -> HandlerResult {
    ctx.require(AdminSection::Categories)?;
    let summary = summary(ctx, id).await?;
    Ok(Reply::screen(views::admin::category(&summary)))
}

pub async fn start_new(ctx: &Ctx<'_>) -> HandlerResult {
    ctx.require(AdminSection::Categories)?;
    category_step(ctx, CategoryWizard::new(), None).await
}

pub async fn category_step(
    ctx: &Ctx<'_>,
    wizard: CategoryWizard,
    error: Option<&StepError>,
) -> HandlerResult {
    ctx.require(AdminSection::Categories)?;
    let message = error.map(ToString::to_string);
    let screen = views::wizard::category_step(&wizard, message.as_deref());
    ctx.set_dialogue(Dialogue::NewCategory(wizard)).await;
    Ok(Reply::screen(screen))
}

/// Insert the category; a taken name is reported as a conflict.
pub async fn create_category(ctx: &Ctx<'_>, new: &NewCategory) -> HandlerResult {
    ctx.require(AdminSection::Categories)?;
    ctx.clear_dialogue().await;
    let category = CategoryRepository::new(ctx.pool()).create(new).await?;
    info!(category_id = %category.id, name = %category.name, "Category created");

    let summary = CategorySummary {
        category,
        project_count: 0,
    };
    Ok(Reply::screen(views::with_notice(
        "✅ Category created.",
        views::admin::category(&summary),
    )))
}

pub async fn start_edit(ctx: &Ctx<'_>, id: CategoryId, field: CategoryField) -> HandlerResult {
    ctx.require(AdminSection::Categories)?;
    let summary = summary(ctx, id).await?;
    let category = &summary.category;
    let current = match field {
        CategoryField::Name => Some(category.name.as_str()),
        CategoryField::Description => category.description.as_deref(),
        CategoryField::Icon => category.icon.as_deref(),
    };

    let mut question = format!(
        "✏️ <b>{}</b> of «{}»\n\nCurrent: {}\n\nSend the new value.",
        field.label(),
        views::escape(&category.name),
        current.map_or_else(|| "—".to_string(), views::escape),
    );
    if field != CategoryField::Name {
        question.push_str(" Send <code>-</code> to clear it.");
    }
    ctx.set_dialogue(Dialogue::EditCategory {
        category_id: id,
        field,
    })
    .await;
    Ok(Reply::screen(views::wizard::prompt(&question, None)))
}

pub async fn save_category_field(
    ctx: &Ctx<'_>,
    id: CategoryId,
    field: CategoryField,
    text: &str,
) -> HandlerResult {
    ctx.require(AdminSection::Categories)?;
    let update = match field.parse(text) {
        Ok(update) => update,
        Err(e) => {
            return Ok(Reply::screen(views::wizard::prompt(
                &format!("✏️ <b>{}</b>\n\nSend the new value.", field.label()),
                Some(&e.to_string()),
            )));
        }
    };

    CategoryRepository::new(ctx.pool()).update(id, &update).await?;
    ctx.clear_dialogue().await;
    info!(category_id = %id, field = field.code(), "Category updated");

    let summary = summary(ctx, id).await?;
    Ok(Reply::screen(views::with_notice(
        "✅ Saved.",
        views::admin::category(&summary),
    )))
}

pub async fn confirm_delete(ctx: &Ctx<'_>, id: CategoryId) -> HandlerResult {
    ctx.require(AdminSection::Categories)?;
    let summary = summary(ctx, id).await?;
    if summary.project_count > 0 {
        return Ok(Reply::alert(format!(
            "This category still has {} project(s). Move or delete them first.",
            summary.project_count
        )));
    }
    Ok(Reply::screen(views::admin::confirm_delete_category(&summary)))
}

/// Delete an empty category.
pub async fn delete(ctx: &Ctx<'_>, id: CategoryId) -> HandlerResult {
    ctx.require(AdminSection::Categories)?;
    CategoryRepository::new(ctx.pool()).delete(id).await?;
    info!(category_id = %id, "Category deleted");

    let reply = list(ctx).await?;
    Ok(reply.with_toast("🗑 Category deleted"))
}
