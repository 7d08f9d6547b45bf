//! Catalog management: listing, editing, hiding and deleting projects,
//! attaching deliverables and the new project wizard.

use tracing::info;

use studybot_core::{AdminSection, ProjectId};

use crate::conversation::{Dialogue, ProjectWizard, StepError, parse_project_field};
use crate::db::{CategoryRepository, ProjectRepository};
use crate::error::AppError;
use crate::handlers::{Ctx, HandlerResult, Reply};
use crate::models::{CatalogFilter, NewProject, Project, ProjectField};
use crate::services::storage::{MAX_FILE_BYTES, display_name};
use crate::telegram::Document;
use crate::views::{self, PAGE_SIZE, clamp_page, page_offset};

async fn load(ctx: &Ctx<'_>, id: ProjectId) -> Result<Project, AppError> {
    ProjectRepository::new(ctx.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Project #{id}")))
}

/// The admin card of `project` with its category name.
async fn render(ctx: &Ctx<'_>, project: &Project) -> Result<views::Screen, AppError> {
    let category = CategoryRepository::new(ctx.pool())
        .get(project.category_id)
        .await?
        .map(|c| c.label());
    Ok(views::admin::project(project, category.as_deref()))
}

/// Current value of a field, shown when asking for a new one.
fn current_value(project: &Project, field: ProjectField) -> String {
    let value = match field {
        ProjectField::Title => Some(project.title.clone()),
        ProjectField::Description => Some(project.description.clone()),
        ProjectField::Price => Some(project.price.to_string()),
        ProjectField::DiscountPrice => project.discount_price.map(|p| p.to_string()),
        ProjectField::Languages => project.programming_languages.clone(),
        ProjectField::Technologies => project.technologies.clone(),
        ProjectField::DemoUrl => project.demo_url.clone(),
    };
    value.map_or_else(|| "—".to_string(), |v| views::escape(&views::truncate(&v, 300)))
}

pub async fn list(ctx: &Ctx<'_>, page: u32) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    let repo = ProjectRepository::new(ctx.pool());
    let total = repo.count(CatalogFilter::All, false).await?;
    let page = clamp_page(page, total);
    let projects = repo
        .list(CatalogFilter::All, false, PAGE_SIZE, page_offset(page))
        .await?;
    Ok(Reply::screen(views::admin::projects(&projects, page, total)))
}

pub async fn view(ctx: &Ctx<'_>, id: ProjectId) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    let project = load(ctx, id).await?;
    Ok(Reply::screen(render(ctx, &project).await?))
}

pub async fn start_edit(ctx: &Ctx<'_>, id: ProjectId, field: ProjectField) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    let project = load(ctx, id).await?;

    let mut question = format!(
        "✏️ <b>{}</b> of #{id}\n\nCurrent: {}\n\nSend the new value.",
        field.label(),
        current_value(&project, field),
    );
    if field.is_clearable() {
        question.push_str(" Send <code>-</code> to clear it.");
    }
    ctx.set_dialogue(Dialogue::EditProject {
        project_id: id,
        field,
    })
    .await;
    Ok(Reply::screen(views::wizard::prompt(&question, None)))
}

/// Validate and store one field; a bad value asks again.
pub async fn save_project_field(
    ctx: &Ctx<'_>,
    id: ProjectId,
    field: ProjectField,
    text: &str,
) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    let project = load(ctx, id).await?;

    let update = match parse_project_field(field, text, project.price) {
        Ok(update) => update,
        Err(e) => {
            let question = format!("✏️ <b>{}</b> of #{id}\n\nSend the new value.", field.label());
            return Ok(Reply::screen(views::wizard::prompt(
                &question,
                Some(&e.to_string()),
            )));
        }
    };

    let updated = ProjectRepository::new(ctx.pool()).update(id, &update).await?;
    ctx.clear_dialogue().await;
    info!(project_id = %id, field = field.code(), "Project updated");
    Ok(Reply::screen(views::with_notice(
        "✅ Saved.",
        render(ctx, &updated).await?,
    )))
}

pub async fn toggle(ctx: &Ctx<'_>, id: ProjectId) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    let project = ProjectRepository::new(ctx.pool()).toggle_active(id).await?;
    info!(project_id = %id, active = project.is_active, "Project visibility changed");

    let toast = if project.is_active {
        "👁 Project is visible"
    } else {
        "🙈 Project is hidden"
    };
    Ok(Reply::screen(render(ctx, &project).await?).with_toast(toast))
}

pub async fn confirm_delete(ctx: &Ctx<'_>, id: ProjectId) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    let project = load(ctx, id).await?;
    Ok(Reply::screen(views::admin::confirm_delete_project(&project)))
}

/// Delete a project that nobody has bought yet.
pub async fn delete(ctx: &Ctx<'_>, id: ProjectId) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    ProjectRepository::new(ctx.pool()).delete(id).await?;
    info!(project_id = %id, "Project deleted");

    let reply = list(ctx, 0).await?;
    Ok(reply.with_toast(format!("🗑 Project #{id} deleted")))
}

pub async fn start_attach_file(ctx: &Ctx<'_>, id: ProjectId) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    let project = load(ctx, id).await?;

    let current = project
        .file_path
        .as_deref()
        .map_or_else(|| "none".to_string(), |p| views::escape(&display_name(p)));
    ctx.set_dialogue(Dialogue::ProjectFile { project_id: id }).await;
    Ok(Reply::screen(views::wizard::prompt(
        &format!(
            "📎 Send the deliverable for <b>{}</b> as a document (up to 20 MB).\n\nCurrent file: {current}",
            views::escape(&project.title),
        ),
        None,
    )))
}

/// Download an uploaded document and make it the project's deliverable.
pub async fn attach_file(ctx: &Ctx<'_>, id: ProjectId, document: &Document) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    if document.file_size.is_some_and(|size| size > MAX_FILE_BYTES) {
        return Err(AppError::bad_request("The file is larger than 20 MB."));
    }
    let project = load(ctx, id).await?;

    let bytes = ctx.state.messenger().download_document(&document.file_id).await?;
    let name = document.file_name.as_deref().unwrap_or("project.zip");
    let path = ctx
        .state
        .storage()
        .save_project_file(project.id, name, &bytes)
        .await?;
    let updated = ProjectRepository::new(ctx.pool()).set_file(id, &path).await?;
    ctx.clear_dialogue().await;
    info!(project_id = %id, path = %path, size = bytes.len(), "Project file attached");

    Ok(Reply::fresh(views::with_notice(
        "✅ File attached.",
        render(ctx, &updated).await?,
    )))
}

pub async fn start_new(ctx: &Ctx<'_>) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    let categories = CategoryRepository::new(ctx.pool()).list().await?;
    if categories.is_empty() {
        return Err(AppError::bad_request("Create a category first."));
    }
    project_step(ctx, ProjectWizard::new(), None).await
}

/// Keep the project wizard going after an answer.
pub async fn project_step(
    ctx: &Ctx<'_>,
    wizard: ProjectWizard,
    error: Option<&StepError>,
) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    let categories = CategoryRepository::new(ctx.pool()).list().await?;
    let message = error.map(ToString::to_string);
    let screen = views::wizard::project_step(&wizard, &categories, message.as_deref());
    ctx.set_dialogue(Dialogue::NewProject(wizard)).await;
    Ok(Reply::screen(screen))
}

pub async fn create_project(ctx: &Ctx<'_>, new: &NewProject) -> HandlerResult {
    ctx.require(AdminSection::Catalog)?;
    ctx.clear_dialogue().await;
    let project = ProjectRepository::new(ctx.pool()).create(new).await?;
    info!(project_id = %project.id, title = %project.title, "Project created");

    Ok(Reply::screen(views::with_notice(
        "✅ Project created. Attach the deliverable so buyers can download it.",
        render(ctx, &project).await?,
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use studybot_core::{CategoryId, Price, ProjectLevel, ProjectType};

    use super::*;

    fn project() -> Project {
        Project {
            id: ProjectId::new(4),
            title: "Library system".to_string(),
            description: "Java desktop app".to_string(),
            category_id: CategoryId::new(1),
            project_type: ProjectType::Coursework,
            level: ProjectLevel::Basic,
            technologies: None,
            programming_languages: Some("Java <17>".to_string()),
            price: Price::from_amount(Decimal::from(9000)),
            discount_price: None,
            file_path: None,
            image_path: None,
            demo_url: None,
            views_count: 0,
            purchases_count: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_current_value() {
        let project = project();
        assert_eq!(current_value(&project, ProjectField::DiscountPrice), "—");
        assert_eq!(current_value(&project, ProjectField::Languages), "Java &lt;17&gt;");
        assert_eq!(
            current_value(&project, ProjectField::Price),
            project.price.to_string()
        );
    }
}
