//! Support ticket wizard (subject → message) and profile field edits.

use serde::{Deserialize, Serialize};

use studybot_core::{Email, OrderId, Phone, UserId};

use super::input::{StepError, required_text};
use crate::models::{NewTicket, ProfileUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStep {
    Subject,
    Message,
}

impl TicketStep {
    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        match self {
            Self::Subject => "What is your question about? Send a short subject.",
            Self::Message => "Describe the problem in detail.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketWizard {
    pub step: TicketStep,
    /// Set when the ticket is opened from an order card.
    pub order_id: Option<OrderId>,
    pub subject: String,
}

impl TicketWizard {
    #[must_use]
    pub const fn new(order_id: Option<OrderId>) -> Self {
        Self {
            step: TicketStep::Subject,
            order_id,
            subject: String::new(),
        }
    }

    /// Tickets about an order start with the subject filled in.
    #[must_use]
    pub fn about_order(order_id: OrderId) -> Self {
        Self {
            step: TicketStep::Message,
            order_id: Some(order_id),
            subject: format!("Order #{order_id}"),
        }
    }

    /// Take the next answer. Returns the ticket once the message is in.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; the step does not change.
    pub fn apply_text(&mut self, text: &str, user_id: UserId) -> Result<Option<NewTicket>, StepError> {
        match self.step {
            TicketStep::Subject => {
                self.subject = required_text(text, "Subject", 3, 255)?;
                self.step = TicketStep::Message;
                Ok(None)
            }
            TicketStep::Message => {
                let message = required_text(text, "Message", 10, 4000)?;
                Ok(Some(NewTicket {
                    user_id,
                    order_id: self.order_id,
                    subject: self.subject.clone(),
                    message,
                }))
            }
        }
    }
}

/// Profile fields a user can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileField {
    FirstName,
    Phone,
    Email,
}

impl ProfileField {
    pub const ALL: &'static [Self] = &[Self::FirstName, Self::Phone, Self::Email];

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FirstName => "name",
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.code() == code)
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FirstName => "Name",
            Self::Phone => "Phone",
            Self::Email => "Email",
        }
    }

    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        match self {
            Self::FirstName => "Send your name.",
            Self::Phone => "Send your phone number, e.g. <code>+7 701 123 45 67</code>.",
            Self::Email => "Send your email address.",
        }
    }

    /// Validate an answer into a profile change.
    ///
    /// # Errors
    ///
    /// Returns the validation failure for the field.
    pub fn parse(&self, text: &str) -> Result<ProfileUpdate, StepError> {
        Ok(match self {
            Self::FirstName => ProfileUpdate::FirstName(required_text(text, "Name", 2, 100)?),
            Self::Phone => ProfileUpdate::Phone(Phone::parse(text)?),
            Self::Email => ProfileUpdate::Email(Email::parse(text)?),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_wizard() {
        let mut wizard = TicketWizard::new(None);
        assert_eq!(wizard.apply_text("Refund", UserId::new(2)).unwrap(), None);
        assert_eq!(wizard.step, TicketStep::Message);

        assert!(wizard.apply_text("help", UserId::new(2)).is_err());
        let ticket = wizard
            .apply_text("The archive I bought does not open.", UserId::new(2))
            .unwrap()
            .unwrap();
        assert_eq!(ticket.subject, "Refund");
        assert_eq!(ticket.order_id, None);
    }

    #[test]
    fn test_ticket_about_order_skips_subject() {
        let mut wizard = TicketWizard::about_order(OrderId::new(14));
        let ticket = wizard
            .apply_text("When will the draft be ready?", UserId::new(2))
            .unwrap()
            .unwrap();
        assert_eq!(ticket.subject, "Order #14");
        assert_eq!(ticket.order_id, Some(OrderId::new(14)));
    }

    #[test]
    fn test_profile_field_parse() {
        assert_eq!(
            ProfileField::Email.parse(" Student@Mail.KZ ").unwrap(),
            ProfileUpdate::Email(Email::parse("Student@mail.kz").unwrap())
        );
        assert!(matches!(
            ProfileField::Email.parse("student at mail"),
            Err(StepError::Email(_))
        ));
        assert!(matches!(
            ProfileField::Phone.parse("call me"),
            Err(StepError::Phone(_))
        ));
        assert_eq!(
            ProfileField::from_code("phone"),
            Some(ProfileField::Phone)
        );
    }
}
