//! Custom order wizard: type → description → technologies → deadline →
//! budget → contact → confirm.

use serde::{Deserialize, Serialize};

use studybot_core::{ProjectType, UserId};

use super::input::{StepError, optional_text, required_text};
use crate::models::NewOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStep {
    Type,
    Description,
    Technologies,
    Deadline,
    Budget,
    Contact,
    Confirm,
}

impl OrderStep {
    /// Question asked at this step.
    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        match self {
            Self::Type => "What kind of work do you need?",
            Self::Description => {
                "Describe the task: topic, requirements, anything the author should know."
            }
            Self::Technologies => "Which languages and technologies should be used?",
            Self::Deadline => "When do you need it? (e.g. <i>by 15 May</i>)",
            Self::Budget => "What is your budget?",
            Self::Contact => "How should we contact you besides Telegram? (phone, email)",
            Self::Confirm => "Check your order and confirm.",
        }
    }

    #[must_use]
    pub const fn is_skippable(&self) -> bool {
        matches!(self, Self::Deadline | Self::Budget | Self::Contact)
    }

    /// 1-based position shown as "Step N/6".
    #[must_use]
    pub const fn number(&self) -> usize {
        match self {
            Self::Type => 1,
            Self::Description => 2,
            Self::Technologies => 3,
            Self::Deadline => 4,
            Self::Budget => 5,
            Self::Contact | Self::Confirm => 6,
        }
    }
}

/// Answers collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub project_type: Option<ProjectType>,
    pub description: String,
    pub technologies: String,
    pub deadline: Option<String>,
    pub budget: Option<String>,
    pub contact_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWizard {
    pub step: OrderStep,
    pub draft: OrderDraft,
}

impl Default for OrderWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderWizard {
    pub const TOTAL_STEPS: usize = 6;

    #[must_use]
    pub fn new() -> Self {
        Self {
            step: OrderStep::Type,
            draft: OrderDraft::default(),
        }
    }

    /// Answer the type question with a button.
    ///
    /// # Errors
    ///
    /// Returns `StepError::ExpectedButton` outside the type step.
    pub fn pick_type(&mut self, project_type: ProjectType) -> Result<OrderStep, StepError> {
        if self.step != OrderStep::Type {
            return Err(StepError::ExpectedButton);
        }
        self.draft.project_type = Some(project_type);
        self.step = OrderStep::Description;
        Ok(self.step)
    }

    /// Answer the current question with text.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; the step does not change.
    pub fn apply_text(&mut self, text: &str) -> Result<OrderStep, StepError> {
        self.step = match self.step {
            OrderStep::Type | OrderStep::Confirm => return Err(StepError::ExpectedButton),
            OrderStep::Description => {
                self.draft.description = required_text(text, "Description", 10, 4000)?;
                OrderStep::Technologies
            }
            OrderStep::Technologies => {
                self.draft.technologies = required_text(text, "Technologies", 2, 500)?;
                OrderStep::Deadline
            }
            OrderStep::Deadline => {
                self.draft.deadline = optional_text(text, "Deadline", 255)?;
                OrderStep::Budget
            }
            OrderStep::Budget => {
                self.draft.budget = optional_text(text, "Budget", 255)?;
                OrderStep::Contact
            }
            OrderStep::Contact => {
                self.draft.contact_info = optional_text(text, "Contact", 255)?;
                OrderStep::Confirm
            }
        };
        Ok(self.step)
    }

    /// Leave the current optional answer empty.
    ///
    /// # Errors
    ///
    /// Returns `StepError::NotSkippable` on required steps.
    pub fn skip(&mut self) -> Result<OrderStep, StepError> {
        self.step = match self.step {
            OrderStep::Deadline => {
                self.draft.deadline = None;
                OrderStep::Budget
            }
            OrderStep::Budget => {
                self.draft.budget = None;
                OrderStep::Contact
            }
            OrderStep::Contact => {
                self.draft.contact_info = None;
                OrderStep::Confirm
            }
            _ => return Err(StepError::NotSkippable),
        };
        Ok(self.step)
    }

    /// The order to insert, once every step is answered.
    #[must_use]
    pub fn to_new_order(&self, user_id: UserId) -> Option<NewOrder> {
        if self.step != OrderStep::Confirm {
            return None;
        }
        Some(NewOrder {
            user_id,
            project_type: self.draft.project_type?,
            description: self.draft.description.clone(),
            technologies: Some(self.draft.technologies.clone()),
            deadline: self.draft.deadline.clone(),
            budget: self.draft.budget.clone(),
            contact_info: self.draft.contact_info.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_full_walk_through() {
        let mut wizard = OrderWizard::new();
        assert_eq!(wizard.pick_type(ProjectType::Coursework).unwrap(), OrderStep::Description);
        wizard
            .apply_text("Library management system with a web UI")
            .unwrap();
        wizard.apply_text("Python, Django, PostgreSQL").unwrap();
        wizard.apply_text("by 15 May").unwrap();
        assert_eq!(wizard.skip().unwrap(), OrderStep::Contact);
        assert_eq!(wizard.apply_text("-").unwrap(), OrderStep::Confirm);

        let order = wizard.to_new_order(UserId::new(3)).unwrap();
        assert_eq!(order.project_type, ProjectType::Coursework);
        assert_eq!(order.technologies.as_deref(), Some("Python, Django, PostgreSQL"));
        assert_eq!(order.deadline.as_deref(), Some("by 15 May"));
        assert_eq!(order.budget, None);
        assert_eq!(order.contact_info, None);
    }

    #[test]
    fn test_invalid_answer_keeps_step() {
        let mut wizard = OrderWizard::new();
        wizard.pick_type(ProjectType::Diploma).unwrap();
        let err = wizard.apply_text("short").unwrap_err();
        assert!(matches!(err, StepError::TooShort { min: 10, .. }));
        assert_eq!(wizard.step, OrderStep::Description);
        assert!(wizard.to_new_order(UserId::new(1)).is_none());
    }

    #[test]
    fn test_required_steps_cannot_be_skipped() {
        let mut wizard = OrderWizard::new();
        assert_eq!(wizard.skip(), Err(StepError::NotSkippable));
        assert_eq!(wizard.apply_text("Diploma"), Err(StepError::ExpectedButton));
        wizard.pick_type(ProjectType::Diploma).unwrap();
        assert_eq!(wizard.pick_type(ProjectType::Project), Err(StepError::ExpectedButton));
    }
}
