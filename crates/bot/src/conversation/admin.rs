//! Admin wizards: new project, new category, broadcast, and single-field
//! edits of projects, categories and orders.

use serde::{Deserialize, Serialize};

use studybot_core::{BroadcastAudience, CategoryId, Price, ProjectLevel, ProjectType};

use super::input::{StepError, optional_text, optional_url, positive_price, required_text};
use crate::models::{CategoryUpdate, NewCategory, NewProject, ProjectField, ProjectUpdate};

// =============================================================================
// New project
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStep {
    Title,
    Description,
    Category,
    Type,
    Level,
    Languages,
    Technologies,
    Price,
    Confirm,
}

impl ProjectStep {
    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        match self {
            Self::Title => "Send the project title.",
            Self::Description => "Send the project description.",
            Self::Category => "Choose a category.",
            Self::Type => "Choose the project type.",
            Self::Level => "Choose the difficulty level.",
            Self::Languages => "Programming languages? (e.g. <i>Python, SQL</i>, or <code>-</code> to skip)",
            Self::Technologies => "Technologies and frameworks? (or <code>-</code> to skip)",
            Self::Price => "Price in tenge? (e.g. <code>15000</code>)",
            Self::Confirm => "Check the project and confirm.",
        }
    }

    #[must_use]
    pub const fn number(&self) -> usize {
        match self {
            Self::Title => 1,
            Self::Description => 2,
            Self::Category => 3,
            Self::Type => 4,
            Self::Level => 5,
            Self::Languages => 6,
            Self::Technologies => 7,
            Self::Price | Self::Confirm => 8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub category_id: Option<CategoryId>,
    pub project_type: Option<ProjectType>,
    pub level: Option<ProjectLevel>,
    pub programming_languages: Option<String>,
    pub technologies: Option<String>,
    pub price: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWizard {
    pub step: ProjectStep,
    pub draft: ProjectDraft,
}

impl Default for ProjectWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectWizard {
    pub const TOTAL_STEPS: usize = 8;

    #[must_use]
    pub fn new() -> Self {
        Self {
            step: ProjectStep::Title,
            draft: ProjectDraft::default(),
        }
    }

    /// Answer a text step.
    ///
    /// # Errors
    ///
    /// Returns the validation failure, or `StepError::ExpectedButton` on
    /// button steps; the step does not change.
    pub fn apply_text(&mut self, text: &str) -> Result<ProjectStep, StepError> {
        self.step = match self.step {
            ProjectStep::Title => {
                self.draft.title = required_text(text, "Title", 3, 255)?;
                ProjectStep::Description
            }
            ProjectStep::Description => {
                self.draft.description = required_text(text, "Description", 10, 4000)?;
                ProjectStep::Category
            }
            ProjectStep::Languages => {
                self.draft.programming_languages = optional_text(text, "Languages", 255)?;
                ProjectStep::Technologies
            }
            ProjectStep::Technologies => {
                self.draft.technologies = optional_text(text, "Technologies", 1000)?;
                ProjectStep::Price
            }
            ProjectStep::Price => {
                self.draft.price = Some(positive_price(text)?);
                ProjectStep::Confirm
            }
            ProjectStep::Category | ProjectStep::Type | ProjectStep::Level | ProjectStep::Confirm => {
                return Err(StepError::ExpectedButton);
            }
        };
        Ok(self.step)
    }

    /// # Errors
    ///
    /// Returns `StepError::ExpectedButton` outside the category step.
    pub fn pick_category(&mut self, category_id: CategoryId) -> Result<ProjectStep, StepError> {
        if self.step != ProjectStep::Category {
            return Err(StepError::ExpectedButton);
        }
        self.draft.category_id = Some(category_id);
        self.step = ProjectStep::Type;
        Ok(self.step)
    }

    /// # Errors
    ///
    /// Returns `StepError::ExpectedButton` outside the type step.
    pub fn pick_type(&mut self, project_type: ProjectType) -> Result<ProjectStep, StepError> {
        if self.step != ProjectStep::Type {
            return Err(StepError::ExpectedButton);
        }
        self.draft.project_type = Some(project_type);
        self.step = ProjectStep::Level;
        Ok(self.step)
    }

    /// # Errors
    ///
    /// Returns `StepError::ExpectedButton` outside the level step.
    pub fn pick_level(&mut self, level: ProjectLevel) -> Result<ProjectStep, StepError> {
        if self.step != ProjectStep::Level {
            return Err(StepError::ExpectedButton);
        }
        self.draft.level = Some(level);
        self.step = ProjectStep::Languages;
        Ok(self.step)
    }

    /// Skip languages or technologies.
    ///
    /// # Errors
    ///
    /// Returns `StepError::NotSkippable` on required steps.
    pub fn skip(&mut self) -> Result<ProjectStep, StepError> {
        match self.step {
            ProjectStep::Languages | ProjectStep::Technologies => self.apply_text("-"),
            _ => Err(StepError::NotSkippable),
        }
    }

    /// The project to insert, once every step is answered.
    #[must_use]
    pub fn to_new_project(&self) -> Option<NewProject> {
        if self.step != ProjectStep::Confirm {
            return None;
        }
        Some(NewProject {
            title: self.draft.title.clone(),
            description: self.draft.description.clone(),
            category_id: self.draft.category_id?,
            project_type: self.draft.project_type?,
            level: self.draft.level?,
            programming_languages: self.draft.programming_languages.clone(),
            technologies: self.draft.technologies.clone(),
            price: self.draft.price?,
        })
    }
}

/// Validate an answer for a single project field.
///
/// `-` clears optional fields. A discount must be below `current_price`.
///
/// # Errors
///
/// Returns the validation failure for the field.
pub fn parse_project_field(
    field: ProjectField,
    text: &str,
    current_price: Price,
) -> Result<ProjectUpdate, StepError> {
    Ok(match field {
        ProjectField::Title => ProjectUpdate::Title(required_text(text, "Title", 3, 255)?),
        ProjectField::Description => {
            ProjectUpdate::Description(required_text(text, "Description", 10, 4000)?)
        }
        ProjectField::Price => ProjectUpdate::Price(positive_price(text)?),
        ProjectField::DiscountPrice => {
            if optional_text(text, "Discount", 32)?.is_none() {
                ProjectUpdate::DiscountPrice(None)
            } else {
                let discount = positive_price(text)?;
                if discount.amount >= current_price.amount {
                    return Err(StepError::DiscountNotLower {
                        price: current_price,
                    });
                }
                ProjectUpdate::DiscountPrice(Some(discount))
            }
        }
        ProjectField::Languages => {
            ProjectUpdate::Languages(optional_text(text, "Languages", 255)?)
        }
        ProjectField::Technologies => {
            ProjectUpdate::Technologies(optional_text(text, "Technologies", 1000)?)
        }
        ProjectField::DemoUrl => ProjectUpdate::DemoUrl(optional_url(text)?),
    })
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryStep {
    Name,
    Description,
    Icon,
    Confirm,
}

impl CategoryStep {
    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        match self {
            Self::Name => "Send the category name.",
            Self::Description => "Send a description (or <code>-</code> to skip).",
            Self::Icon => "Send an emoji icon (or <code>-</code> to skip).",
            Self::Confirm => "Check the category and confirm.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWizard {
    pub step: CategoryStep,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl Default for CategoryWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryWizard {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            step: CategoryStep::Name,
            name: String::new(),
            description: None,
            icon: None,
        }
    }

    /// Answer the current step.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; the step does not change.
    pub fn apply_text(&mut self, text: &str) -> Result<CategoryStep, StepError> {
        self.step = match self.step {
            CategoryStep::Name => {
                self.name = required_text(text, "Name", 2, 255)?;
                CategoryStep::Description
            }
            CategoryStep::Description => {
                self.description = optional_text(text, "Description", 1000)?;
                CategoryStep::Icon
            }
            CategoryStep::Icon => {
                self.icon = optional_text(text, "Icon", 8)?;
                CategoryStep::Confirm
            }
            CategoryStep::Confirm => return Err(StepError::ExpectedButton),
        };
        Ok(self.step)
    }

    /// # Errors
    ///
    /// Returns `StepError::NotSkippable` on the name step.
    pub fn skip(&mut self) -> Result<CategoryStep, StepError> {
        match self.step {
            CategoryStep::Description | CategoryStep::Icon => self.apply_text("-"),
            _ => Err(StepError::NotSkippable),
        }
    }

    #[must_use]
    pub fn to_new_category(&self) -> Option<NewCategory> {
        (self.step == CategoryStep::Confirm).then(|| NewCategory {
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
        })
    }
}

/// Editable category fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryField {
    Name,
    Description,
    Icon,
}

impl CategoryField {
    pub const ALL: &'static [Self] = &[Self::Name, Self::Description, Self::Icon];

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "desc",
            Self::Icon => "icon",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.code() == code)
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Description => "Description",
            Self::Icon => "Icon",
        }
    }

    /// Validate an answer into a category change.
    ///
    /// # Errors
    ///
    /// Returns the validation failure for the field.
    pub fn parse(&self, text: &str) -> Result<CategoryUpdate, StepError> {
        Ok(match self {
            Self::Name => CategoryUpdate::Name(required_text(text, "Name", 2, 255)?),
            Self::Description => {
                CategoryUpdate::Description(optional_text(text, "Description", 1000)?)
            }
            Self::Icon => CategoryUpdate::Icon(optional_text(text, "Icon", 8)?),
        })
    }
}

// =============================================================================
// Broadcasts
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastWizard {
    Message,
    Audience { message: String },
    Confirm { message: String, audience: BroadcastAudience },
}

impl BroadcastWizard {
    /// # Errors
    ///
    /// Returns `StepError::ExpectedButton` once the message is set.
    pub fn apply_text(&mut self, text: &str) -> Result<(), StepError> {
        if *self != Self::Message {
            return Err(StepError::ExpectedButton);
        }
        *self = Self::Audience {
            message: required_text(text, "Message", 1, 4000)?,
        };
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StepError::ExpectedButton` outside the audience step.
    pub fn pick_audience(&mut self, audience: BroadcastAudience) -> Result<(), StepError> {
        let Self::Audience { message } = self else {
            return Err(StepError::ExpectedButton);
        };
        *self = Self::Confirm {
            message: std::mem::take(message),
            audience,
        };
        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// What an admin is typing about an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderNoteKind {
    Price,
    Comment,
    /// Rejection reason; saving it also moves the order to `rejected`.
    Rejection,
}

impl OrderNoteKind {
    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        match self {
            Self::Price => "Send the price for this order in tenge.",
            Self::Comment => "Send a comment for the customer.",
            Self::Rejection => "Send the reason for rejecting this order.",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn tenge(amount: i64) -> Price {
        Price::from_amount(Decimal::from(amount))
    }

    #[test]
    fn test_project_wizard_walk_through() {
        let mut wizard = ProjectWizard::new();
        wizard.apply_text("Online store in Django").unwrap();
        wizard
            .apply_text("Shop with cart, checkout and an admin panel.")
            .unwrap();
        assert_eq!(wizard.apply_text("Web"), Err(StepError::ExpectedButton));
        wizard.pick_category(CategoryId::new(5)).unwrap();
        wizard.pick_type(ProjectType::Coursework).unwrap();
        wizard.pick_level(ProjectLevel::Intermediate).unwrap();
        wizard.apply_text("Python").unwrap();
        assert_eq!(wizard.skip().unwrap(), ProjectStep::Price);

        assert!(matches!(wizard.apply_text("abc"), Err(StepError::Price(_))));
        assert_eq!(wizard.step, ProjectStep::Price);
        assert_eq!(wizard.apply_text("15 000").unwrap(), ProjectStep::Confirm);

        let project = wizard.to_new_project().unwrap();
        assert_eq!(project.title, "Online store in Django");
        assert_eq!(project.category_id, CategoryId::new(5));
        assert_eq!(project.level, ProjectLevel::Intermediate);
        assert_eq!(project.programming_languages.as_deref(), Some("Python"));
        assert_eq!(project.technologies, None);
        assert_eq!(project.price, tenge(15_000));
    }

    #[test]
    fn test_project_wizard_incomplete() {
        let mut wizard = ProjectWizard::new();
        wizard.apply_text("Online store").unwrap();
        assert!(wizard.to_new_project().is_none());
        assert_eq!(wizard.skip(), Err(StepError::NotSkippable));
    }

    #[test]
    fn test_parse_discount() {
        let price = tenge(8_000);
        assert_eq!(
            parse_project_field(ProjectField::DiscountPrice, "6500", price).unwrap(),
            ProjectUpdate::DiscountPrice(Some(tenge(6_500)))
        );
        assert_eq!(
            parse_project_field(ProjectField::DiscountPrice, "-", price).unwrap(),
            ProjectUpdate::DiscountPrice(None)
        );
        assert_eq!(
            parse_project_field(ProjectField::DiscountPrice, "9000", price),
            Err(StepError::DiscountNotLower { price })
        );
    }

    #[test]
    fn test_parse_required_fields_reject_clear() {
        assert!(parse_project_field(ProjectField::Title, "-", tenge(1)).is_err());
        assert!(parse_project_field(ProjectField::Price, "-", tenge(1)).is_err());
        assert_eq!(
            parse_project_field(ProjectField::Languages, "-", tenge(1)).unwrap(),
            ProjectUpdate::Languages(None)
        );
    }

    #[test]
    fn test_category_wizard_skips() {
        let mut wizard = CategoryWizard::new();
        wizard.apply_text("Python").unwrap();
        wizard.skip().unwrap();
        wizard.apply_text("🐍").unwrap();
        let category = wizard.to_new_category().unwrap();
        assert_eq!(category.name, "Python");
        assert_eq!(category.description, None);
        assert_eq!(category.icon.as_deref(), Some("🐍"));
    }

    #[test]
    fn test_broadcast_wizard() {
        let mut wizard = BroadcastWizard::Message;
        assert_eq!(
            wizard.pick_audience(BroadcastAudience::All),
            Err(StepError::ExpectedButton)
        );
        wizard.apply_text("New diplomas in the catalog!").unwrap();
        wizard.pick_audience(BroadcastAudience::Buyers).unwrap();
        assert_eq!(
            wizard,
            BroadcastWizard::Confirm {
                message: "New diplomas in the catalog!".to_string(),
                audience: BroadcastAudience::Buyers
            }
        );
    }
}
