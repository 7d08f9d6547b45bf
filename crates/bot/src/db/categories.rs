//! Category repository.
//!
//! Categories cannot be deleted while any project references them; the
//! check runs inside the delete transaction and the `ON DELETE RESTRICT`
//! foreign key backs it up.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use studybot_core::CategoryId;

use super::RepositoryError;
use crate::models::{Category, CategorySummary, CategoryUpdate, NewCategory};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    description: Option<String>,
    icon: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
            icon: row.icon,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategorySummaryRow {
    #[sqlx(flatten)]
    category: CategoryRow,
    project_count: i64,
}

fn duplicate_name(name: &str) -> String {
    format!("category \"{name}\" already exists")
}

/// Repository for catalog categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List categories alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, icon, created_at FROM categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List categories with the number of projects in each.
    ///
    /// When `active_only` is set only active projects are counted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_counts(
        &self,
        active_only: bool,
    ) -> Result<Vec<CategorySummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategorySummaryRow>(
            r"
            SELECT c.id, c.name, c.description, c.icon, c.created_at,
                   COUNT(p.id) AS project_count
            FROM categories c
            LEFT JOIN projects p ON p.category_id = c.id AND (NOT $1 OR p.is_active)
            GROUP BY c.id
            ORDER BY c.name
            ",
        )
        .bind(active_only)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CategorySummary {
                category: row.category.into(),
                project_count: row.project_count,
            })
            .collect())
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, icon, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (name, description, icon)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, icon, created_at
            ",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.icon)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_violation(e, duplicate_name(&new.name)))?;

        Ok(row.into())
    }

    /// Change one category field.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist, or
    /// `RepositoryError::Conflict` if a rename collides with another category.
    pub async fn update(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, RepositoryError> {
        let (column, value) = match update {
            CategoryUpdate::Name(name) => ("name", Some(name.as_str())),
            CategoryUpdate::Description(description) => ("description", description.as_deref()),
            CategoryUpdate::Icon(icon) => ("icon", icon.as_deref()),
        };

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "UPDATE categories SET {column} = $2 WHERE id = $1 \
             RETURNING id, name, description, icon, created_at"
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_violation(e, duplicate_name(value.unwrap_or_default())))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a category that no project references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while projects reference the
    /// category, or `RepositoryError::NotFound` if it does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let projects: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE category_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if projects > 0 {
            return Err(RepositoryError::Conflict(format!(
                "category still has {projects} project(s)"
            )));
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::conflict_on_violation(e, "category still has projects"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Find a category by exact name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, icon, created_at FROM categories WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
