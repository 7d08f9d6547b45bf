//! Catalog browsing, the cart, purchases, downloads and reviews.

use tracing::info;

use studybot_core::ProjectId;

use super::{Ctx, HandlerResult, Reply};
use crate::conversation::{Dialogue, ReviewWizard, StepError};
use crate::db::{
    CartRepository, CategoryRepository, ProjectRepository, PurchaseRepository, ReviewRepository,
};
use crate::error::AppError;
use crate::models::{CatalogFilter, NewReview, Project};
use crate::services;
use crate::telegram::OutgoingDocument;
use crate::views::{self, PAGE_SIZE, catalog::CardState, clamp_page, page_offset};

/// Reviews shown under a project card.
const CARD_REVIEWS: u32 = 3;

/// Search results shown at once.
const SEARCH_LIMIT: u32 = 10;

pub async fn categories(ctx: &Ctx<'_>) -> HandlerResult {
    let categories = CategoryRepository::new(ctx.pool())
        .list_with_counts(true)
        .await?;
    Ok(Reply::screen(views::catalog::categories_menu(&categories)))
}

pub async fn list(ctx: &Ctx<'_>, filter: CatalogFilter, page: u32) -> HandlerResult {
    let projects = ProjectRepository::new(ctx.pool());
    let total = projects.count(filter, true).await?;
    let page = clamp_page(page, total);
    let items = projects
        .list(filter, true, PAGE_SIZE, page_offset(page))
        .await?;

    let category = match filter {
        CatalogFilter::Category(id) => CategoryRepository::new(ctx.pool()).get(id).await?,
        CatalogFilter::All | CatalogFilter::Type(_) => None,
    };
    let title = views::catalog::list_title(filter, category.as_ref());
    Ok(Reply::screen(views::catalog::project_list(
        &title, filter, &items, page, total,
    )))
}

/// A project the sender may see: active ones, or hidden ones they own.
async fn visible_project(ctx: &Ctx<'_>, id: ProjectId) -> Result<(Project, bool), AppError> {
    let project = ProjectRepository::new(ctx.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Project"))?;
    let owned = PurchaseRepository::new(ctx.pool())
        .has_purchased(ctx.user.id, id)
        .await?;
    if !project.is_active && !owned {
        return Err(AppError::not_found("Project"));
    }
    Ok((project, owned))
}

async fn render_card(ctx: &Ctx<'_>, project: &Project, owned: bool) -> HandlerResult {
    let state = if owned {
        CardState::Owned
    } else if CartRepository::new(ctx.pool())
        .contains(ctx.user.id, project.id)
        .await?
    {
        CardState::InCart
    } else {
        CardState::Available
    };

    let category = CategoryRepository::new(ctx.pool())
        .get(project.category_id)
        .await?;
    let reviews = ReviewRepository::new(ctx.pool());
    let rating = reviews.summary(project.id).await?;
    let latest = reviews.list_for_project(project.id, CARD_REVIEWS).await?;

    Ok(Reply::screen(views::catalog::project_card(
        project,
        category.as_ref(),
        rating,
        &latest,
        state,
    )))
}

pub async fn card(ctx: &Ctx<'_>, id: ProjectId) -> HandlerResult {
    let (project, owned) = visible_project(ctx, id).await?;
    ProjectRepository::new(ctx.pool()).increment_views(id).await?;
    render_card(ctx, &project, owned).await
}

pub async fn add_to_cart(ctx: &Ctx<'_>, id: ProjectId) -> HandlerResult {
    let (project, owned) = visible_project(ctx, id).await?;
    if owned {
        return Ok(Reply::alert("You already own this project."));
    }
    if !project.is_active {
        return Err(AppError::not_found("Project"));
    }

    let added = CartRepository::new(ctx.pool()).add(ctx.user.id, id).await?;
    let toast = if added {
        "🛒 Added to cart"
    } else {
        "Already in your cart"
    };
    Ok(render_card(ctx, &project, false).await?.with_toast(toast))
}

pub async fn remove_from_cart(ctx: &Ctx<'_>, id: ProjectId, in_cart: bool) -> HandlerResult {
    CartRepository::new(ctx.pool())
        .remove(ctx.user.id, id)
        .await?;

    if in_cart {
        return Ok(cart(ctx).await?.with_toast("Removed from cart"));
    }
    let (project, owned) = visible_project(ctx, id).await?;
    Ok(render_card(ctx, &project, owned)
        .await?
        .with_toast("Removed from cart"))
}

pub async fn cart(ctx: &Ctx<'_>) -> HandlerResult {
    let cart = CartRepository::new(ctx.pool()).get(ctx.user.id).await?;
    Ok(Reply::screen(views::catalog::cart(&cart)))
}

pub async fn clear_cart(ctx: &Ctx<'_>) -> HandlerResult {
    CartRepository::new(ctx.pool()).clear(ctx.user.id).await?;
    Ok(cart(ctx).await?.with_toast("Cart cleared"))
}

pub async fn checkout(ctx: &Ctx<'_>) -> HandlerResult {
    let outcome =
        services::checkout_cart(ctx.pool(), ctx.state.gateway(), ctx.user.id).await?;
    info!(
        user_id = %ctx.user.id,
        items = outcome.purchased.len(),
        total = %outcome.total(),
        "Cart checked out"
    );
    Ok(Reply::screen(views::catalog::checkout_done(&outcome)))
}

pub async fn buy_now(ctx: &Ctx<'_>, id: ProjectId) -> HandlerResult {
    let item = services::buy_now(ctx.pool(), ctx.state.gateway(), ctx.user.id, id).await?;
    info!(user_id = %ctx.user.id, project_id = %id, price = %item.price, "Project bought");
    Ok(Reply::screen(views::catalog::buy_done(&item)))
}

/// Send the deliverable of an owned project.
pub async fn download(ctx: &Ctx<'_>, id: ProjectId) -> HandlerResult {
    let owned = PurchaseRepository::new(ctx.pool())
        .has_purchased(ctx.user.id, id)
        .await?;
    if !owned {
        return Err(AppError::bad_request("Buy this project first."));
    }
    let project = ProjectRepository::new(ctx.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Project"))?;
    let Some(path) = project.file_path.as_deref() else {
        return Ok(Reply::alert(
            "The files for this project are not uploaded yet. Please contact support.",
        ));
    };

    let file = ctx.state.storage().read(path).await?;
    info!(user_id = %ctx.user.id, project_id = %id, "Project file sent");
    Ok(Reply::toast("📥 Sending the file…").with_document(OutgoingDocument {
        file_name: file.file_name,
        bytes: file.bytes,
        caption: Some(format!("📥 {}", views::escape(&project.title))),
    }))
}

pub async fn start_search(ctx: &Ctx<'_>) -> HandlerResult {
    ctx.set_dialogue(Dialogue::CatalogSearch).await;
    Ok(Reply::screen(views::catalog::search_prompt()))
}

pub async fn search(ctx: &Ctx<'_>, query: &str) -> HandlerResult {
    ctx.clear_dialogue().await;
    let projects = ProjectRepository::new(ctx.pool())
        .search(query, SEARCH_LIMIT)
        .await?;
    Ok(Reply::screen(views::catalog::search_results(query, &projects)))
}

pub async fn start_review(ctx: &Ctx<'_>, id: ProjectId) -> HandlerResult {
    let (project, owned) = visible_project(ctx, id).await?;
    if !owned {
        return Err(AppError::bad_request("Only buyers can rate a project."));
    }
    let wizard = ReviewWizard::new(id);
    let screen = views::wizard::review_step(&wizard, &project.title, None);
    ctx.set_dialogue(Dialogue::Review(wizard)).await;
    Ok(Reply::screen(screen))
}

/// Re-show the review step, with `error` if the last answer was refused.
pub async fn review_step(
    ctx: &Ctx<'_>,
    wizard: ReviewWizard,
    error: Option<&StepError>,
) -> HandlerResult {
    let title = ProjectRepository::new(ctx.pool())
        .get(wizard.project_id)
        .await?
        .map(|p| p.title)
        .unwrap_or_default();
    let message = error.map(ToString::to_string);
    let screen = views::wizard::review_step(&wizard, &title, message.as_deref());
    ctx.set_dialogue(Dialogue::Review(wizard)).await;
    Ok(Reply::screen(screen))
}

pub async fn save_review(ctx: &Ctx<'_>, review: &NewReview) -> HandlerResult {
    ctx.clear_dialogue().await;
    let saved = ReviewRepository::new(ctx.pool()).upsert(review).await?;
    info!(
        user_id = %ctx.user.id,
        project_id = %review.project_id,
        rating = saved.rating.value(),
        "Review saved"
    );
    Ok(Reply::screen(views::catalog::review_saved(
        review.project_id,
        saved.rating,
    )))
}
