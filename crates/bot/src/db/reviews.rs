//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use studybot_core::{ProjectId, ReviewId, UserId};

use super::{RepositoryError, to_i64};
use crate::models::{NewReview, Rating, RatingSummary, Review};

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    user_id: i32,
    project_id: Option<i32>,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .ok()
            .and_then(Rating::new)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "review {} has rating {}",
                    row.id, row.rating
                ))
            })?;

        Ok(Self {
            id: ReviewId::new(row.id),
            user_id: UserId::new(row.user_id),
            project_id: row.project_id.map(ProjectId::new),
            rating,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

/// Repository for project reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a review, replacing the user's earlier review of the same project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user or project does not exist.
    pub async fn upsert(&self, new: &NewReview) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO reviews (user_id, project_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, project_id)
            DO UPDATE SET rating = EXCLUDED.rating, comment = EXCLUDED.comment, created_at = NOW()
            RETURNING id, user_id, project_id, rating, comment, created_at
            ",
        )
        .bind(new.user_id)
        .bind(new.project_id)
        .bind(i16::from(new.rating.value()))
        .bind(&new.comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_violation(e, "project does not exist"))?;

        row.try_into()
    }

    /// The user's review of a project, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT id, user_id, project_id, rating, comment, created_at
            FROM reviews WHERE user_id = $1 AND project_id = $2
            ",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Latest reviews of a project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_project(
        &self,
        project_id: ProjectId,
        limit: u32,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT id, user_id, project_id, rating, comment, created_at
            FROM reviews WHERE project_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(project_id)
        .bind(to_i64(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Average rating and number of reviews of a project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, project_id: ProjectId) -> Result<RatingSummary, RepositoryError> {
        let (average, count): (Option<f64>, i64) = sqlx::query_as(
            "SELECT AVG(rating)::float8, COUNT(*) FROM reviews WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(self.pool)
        .await?;

        Ok(RatingSummary { average, count })
    }
}
