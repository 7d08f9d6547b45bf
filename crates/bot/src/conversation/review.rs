//! Review wizard: stars (button) → comment (text, skippable).

use serde::{Deserialize, Serialize};

use studybot_core::{ProjectId, UserId};

use super::input::{StepError, optional_text};
use crate::models::{NewReview, Rating};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewWizard {
    pub project_id: ProjectId,
    /// `None` until the user presses a star button.
    pub rating: Option<Rating>,
}

impl ReviewWizard {
    #[must_use]
    pub const fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            rating: None,
        }
    }

    /// Record the star rating.
    ///
    /// # Errors
    ///
    /// Returns `StepError::ExpectedButton` if the rating was already chosen.
    pub const fn pick_rating(&mut self, rating: Rating) -> Result<(), StepError> {
        if self.rating.is_some() {
            return Err(StepError::ExpectedButton);
        }
        self.rating = Some(rating);
        Ok(())
    }

    /// Finish with a comment (`-` for none).
    ///
    /// # Errors
    ///
    /// Returns `StepError::ExpectedButton` before a rating is chosen, or the
    /// comment validation failure.
    pub fn apply_text(&self, text: &str, user_id: UserId) -> Result<NewReview, StepError> {
        let rating = self.rating.ok_or(StepError::ExpectedButton)?;
        Ok(NewReview {
            user_id,
            project_id: self.project_id,
            rating,
            comment: optional_text(text, "Comment", 2000)?,
        })
    }

    /// Finish without a comment.
    ///
    /// # Errors
    ///
    /// Returns `StepError::NotSkippable` before a rating is chosen.
    pub fn skip(&self, user_id: UserId) -> Result<NewReview, StepError> {
        let rating = self.rating.ok_or(StepError::NotSkippable)?;
        Ok(NewReview {
            user_id,
            project_id: self.project_id,
            rating,
            comment: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_review_requires_rating_first() {
        let wizard = ReviewWizard::new(ProjectId::new(4));
        assert_eq!(
            wizard.apply_text("Great code", UserId::new(1)),
            Err(StepError::ExpectedButton)
        );
        assert_eq!(wizard.skip(UserId::new(1)), Err(StepError::NotSkippable));
    }

    #[test]
    fn test_review_with_comment() {
        let mut wizard = ReviewWizard::new(ProjectId::new(4));
        wizard.pick_rating(Rating::new(5).unwrap()).unwrap();
        let review = wizard
            .apply_text("Clean code, easy to defend.", UserId::new(1))
            .unwrap();
        assert_eq!(review.rating.value(), 5);
        assert_eq!(review.comment.as_deref(), Some("Clean code, easy to defend."));

        let review = wizard.skip(UserId::new(1)).unwrap();
        assert_eq!(review.comment, None);
    }
}
