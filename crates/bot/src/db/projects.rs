//! Project (catalog item) repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use studybot_core::{CategoryId, Price, ProjectId, ProjectLevel, ProjectType};

use super::users::escape_like;
use super::{RepositoryError, to_i64};
use crate::models::{CatalogFilter, NewProject, Project, ProjectUpdate};

const PROJECT_COLUMNS: &str = "id, title, description, category_id, project_type, level, \
     technologies, programming_languages, price, discount_price, file_path, image_path, \
     demo_url, views_count, purchases_count, is_active, created_at, updated_at";

/// Matches `CatalogFilter` against `$1` (active only), `$2` (type), `$3` (category).
const FILTER_CLAUSE: &str = "(NOT $1 OR is_active) \
     AND ($2::project_type IS NULL OR project_type = $2) \
     AND ($3::integer IS NULL OR category_id = $3)";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: i32,
    title: String,
    description: String,
    category_id: i32,
    project_type: ProjectType,
    level: ProjectLevel,
    technologies: Option<String>,
    programming_languages: Option<String>,
    price: Decimal,
    discount_price: Option<Decimal>,
    file_path: Option<String>,
    image_path: Option<String>,
    demo_url: Option<String>,
    views_count: i32,
    purchases_count: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = RepositoryError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        if row.price.is_sign_negative() {
            return Err(RepositoryError::DataCorruption(format!(
                "negative price on project {}",
                row.id
            )));
        }

        Ok(Self {
            id: ProjectId::new(row.id),
            title: row.title,
            description: row.description,
            category_id: CategoryId::new(row.category_id),
            project_type: row.project_type,
            level: row.level,
            technologies: row.technologies,
            programming_languages: row.programming_languages,
            price: Price::from_amount(row.price),
            discount_price: row.discount_price.map(Price::from_amount),
            file_path: row.file_path,
            image_path: row.image_path,
            demo_url: row.demo_url,
            views_count: row.views_count,
            purchases_count: row.purchases_count,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const fn filter_binds(filter: CatalogFilter) -> (Option<ProjectType>, Option<CategoryId>) {
    match filter {
        CatalogFilter::All => (None, None),
        CatalogFilter::Type(project_type) => (Some(project_type), None),
        CatalogFilter::Category(category_id) => (None, Some(category_id)),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog projects.
pub struct ProjectRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new project repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List projects matching a filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: CatalogFilter,
        active_only: bool,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Project>, RepositoryError> {
        let (project_type, category_id) = filter_binds(filter);

        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        ))
        .bind(active_only)
        .bind(project_type)
        .bind(category_id)
        .bind(to_i64(limit))
        .bind(to_i64(offset))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count projects matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(
        &self,
        filter: CatalogFilter,
        active_only: bool,
    ) -> Result<i64, RepositoryError> {
        let (project_type, category_id) = filter_binds(filter);

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM projects WHERE {FILTER_CLAUSE}"
        ))
        .bind(active_only)
        .bind(project_type)
        .bind(category_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Get a project by id, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create an active project with no discount or file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn create(&self, new: &NewProject) -> Result<Project, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r"
            INSERT INTO projects (title, description, category_id, project_type, level,
                                  programming_languages, technologies, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PROJECT_COLUMNS}
            "
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.category_id)
        .bind(new.project_type)
        .bind(new.level)
        .bind(&new.programming_languages)
        .bind(&new.technologies)
        .bind(new.price.amount)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_violation(e, "category does not exist"))?;

        row.try_into()
    }

    /// Change exactly one project field.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project does not exist.
    pub async fn update(
        &self,
        id: ProjectId,
        update: &ProjectUpdate,
    ) -> Result<Project, RepositoryError> {
        match update {
            ProjectUpdate::Title(value) => self.update_text(id, "title", Some(value.as_str())).await,
            ProjectUpdate::Description(value) => {
                self.update_text(id, "description", Some(value.as_str())).await
            }
            ProjectUpdate::Languages(value) => {
                self.update_text(id, "programming_languages", value.as_deref())
                    .await
            }
            ProjectUpdate::Technologies(value) => {
                self.update_text(id, "technologies", value.as_deref()).await
            }
            ProjectUpdate::DemoUrl(value) => {
                self.update_text(id, "demo_url", value.as_deref()).await
            }
            ProjectUpdate::Price(price) => {
                self.update_decimal(id, "price", Some(price.amount)).await
            }
            ProjectUpdate::DiscountPrice(price) => {
                self.update_decimal(id, "discount_price", price.map(|p| p.amount))
                    .await
            }
        }
    }

    async fn update_text(
        &self,
        id: ProjectId,
        column: &'static str,
        value: Option<&str>,
    ) -> Result<Project, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "UPDATE projects SET {column} = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn update_decimal(
        &self,
        id: ProjectId,
        column: &'static str,
        value: Option<Decimal>,
    ) -> Result<Project, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "UPDATE projects SET {column} = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Flip `is_active`, returning the updated project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project does not exist.
    pub async fn toggle_active(&self, id: ProjectId) -> Result<Project, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "UPDATE projects SET is_active = NOT is_active, updated_at = NOW() WHERE id = $1 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a project nobody has bought.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if purchases reference the project,
    /// or `RepositoryError::NotFound` if it does not exist.
    pub async fn delete(&self, id: ProjectId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::conflict_on_violation(e, "project has already been purchased")
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count a card view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn increment_views(&self, id: ProjectId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE projects SET views_count = views_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Attach a stored deliverable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project does not exist.
    pub async fn set_file(&self, id: ProjectId, path: &str) -> Result<Project, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "UPDATE projects SET file_path = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(path)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Search active projects by title, description, languages and technologies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Project>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(query.trim()));

        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            r"
            SELECT {PROJECT_COLUMNS} FROM projects
            WHERE is_active
              AND (title ILIKE $1
                   OR description ILIKE $1
                   OR programming_languages ILIKE $1
                   OR technologies ILIKE $1)
            ORDER BY purchases_count DESC, created_at DESC
            LIMIT $2
            "
        ))
        .bind(pattern)
        .bind(to_i64(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Find a project by exact title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_title(&self, title: &str) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE title = $1 ORDER BY id LIMIT 1"
        ))
        .bind(title)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
