//! Screens for dialogue steps.
//!
//! Each screen repeats the validation error (if any) above the question so
//! a rejected answer re-asks the same step.

use std::fmt::Write as _;

use studybot_core::{BroadcastAudience, ProjectLevel, ProjectType};

use super::{Screen, escape};
use crate::conversation::{
    BroadcastWizard, CategoryStep, CategoryWizard, OrderStep, OrderWizard, ProjectStep,
    ProjectWizard, ReviewWizard, TicketStep, TicketWizard,
};
use crate::handlers::callback::Callback;
use crate::models::{Category, Rating};
use crate::telegram::{Button, Keyboard};

fn with_error(error: Option<&str>, body: &str) -> String {
    error.map_or_else(
        || body.to_string(),
        |error| format!("⚠️ {}\n\n{body}", escape(error)),
    )
}

fn skip_and_cancel() -> Keyboard {
    Keyboard::new().row([
        Button::callback("⏭ Skip", Callback::Skip),
        Button::callback("❌ Cancel", Callback::Cancel),
    ])
}

fn confirm_and_cancel() -> Keyboard {
    Keyboard::new().row([
        Button::callback("✅ Confirm", Callback::Confirm),
        Button::callback("❌ Cancel", Callback::Cancel),
    ])
}

fn cancel_only() -> Keyboard {
    Keyboard::new().row(super::cancel())
}

fn type_buttons() -> impl Iterator<Item = Button> {
    ProjectType::ALL.iter().map(|kind| {
        Button::callback(
            format!("{} {}", kind.emoji(), kind.label()),
            Callback::PickType(*kind),
        )
    })
}

fn optional(value: Option<&String>) -> String {
    value.map_or_else(|| "—".to_string(), |v| escape(v))
}

/// A single free-text question with a cancel button.
#[must_use]
pub fn prompt(question: &str, error: Option<&str>) -> Screen {
    Screen::new(with_error(error, question), cancel_only())
}

// =============================================================================
// User wizards
// =============================================================================

#[must_use]
pub fn order_step(wizard: &OrderWizard, error: Option<&str>) -> Screen {
    let step = wizard.step;
    let header = format!(
        "✍️ <b>Custom order</b> · step {}/{}\n\n",
        step.number(),
        OrderWizard::TOTAL_STEPS
    );

    if step == OrderStep::Confirm {
        let draft = &wizard.draft;
        let mut text = String::from("✍️ <b>Check your order</b>\n\n");
        if let Some(kind) = draft.project_type {
            let _ = writeln!(text, "📑 Type: {} {}", kind.emoji(), kind.label());
        }
        let _ = write!(
            text,
            "📝 Description: {}\n🛠 Technologies: {}\n⏰ Deadline: {}\n💵 Budget: {}\n📞 Contact: {}",
            escape(&draft.description),
            escape(&draft.technologies),
            optional(draft.deadline.as_ref()),
            optional(draft.budget.as_ref()),
            optional(draft.contact_info.as_ref()),
        );
        return Screen::new(with_error(error, &text), confirm_and_cancel());
    }

    let keyboard = match step {
        OrderStep::Type => Keyboard::new().grid(type_buttons(), 2).row(super::cancel()),
        _ if step.is_skippable() => skip_and_cancel(),
        _ => cancel_only(),
    };
    Screen::new(
        with_error(error, &format!("{header}{}", step.prompt())),
        keyboard,
    )
}

#[must_use]
pub fn ticket_step(wizard: &TicketWizard, error: Option<&str>) -> Screen {
    let mut text = String::from("📝 <b>New ticket</b>\n\n");
    if wizard.step == TicketStep::Message {
        let _ = write!(text, "Subject: {}\n\n", escape(&wizard.subject));
    }
    text.push_str(wizard.step.prompt());
    Screen::new(with_error(error, &text), cancel_only())
}

#[must_use]
pub fn review_step(wizard: &ReviewWizard, title: &str, error: Option<&str>) -> Screen {
    match wizard.rating {
        None => {
            let stars = (Rating::MIN..=Rating::MAX).filter_map(Rating::new).map(|rating| {
                Button::callback(format!("{}⭐", rating.value()), Callback::PickRating(rating))
            });
            Screen::new(
                with_error(
                    error,
                    &format!("⭐ <b>Rate «{}»</b>\n\nHow many stars?", escape(title)),
                ),
                Keyboard::new().grid(stars, 5).row(super::cancel()),
            )
        }
        Some(rating) => Screen::new(
            with_error(
                error,
                &format!(
                    "⭐ {}\n\nAdd a comment, or skip to save the rating as is.",
                    rating.stars()
                ),
            ),
            skip_and_cancel(),
        ),
    }
}

// =============================================================================
// Admin wizards
// =============================================================================

#[must_use]
pub fn project_step(wizard: &ProjectWizard, categories: &[Category], error: Option<&str>) -> Screen {
    let step = wizard.step;
    if step == ProjectStep::Confirm {
        let draft = &wizard.draft;
        let category = draft
            .category_id
            .and_then(|id| categories.iter().find(|c| c.id == id))
            .map_or_else(|| "—".to_string(), |c| escape(&c.label()));
        let text = format!(
            "➕ <b>New project</b>\n\n\
             Title: {}\nDescription: {}\nCategory: {}\nType: {}\nLevel: {}\n\
             Languages: {}\nTechnologies: {}\nPrice: {}",
            escape(&draft.title),
            escape(&draft.description),
            category,
            draft.project_type.map_or("—", |t| t.label()),
            draft.level.map_or("—", |l| l.label()),
            optional(draft.programming_languages.as_ref()),
            optional(draft.technologies.as_ref()),
            draft.price.map_or_else(|| "—".to_string(), |p| p.to_string()),
        );
        return Screen::new(with_error(error, &text), confirm_and_cancel());
    }

    let keyboard = match step {
        ProjectStep::Category => Keyboard::new()
            .grid(
                categories
                    .iter()
                    .map(|c| Button::callback(c.label(), Callback::PickCategory(c.id))),
                2,
            )
            .row(super::cancel()),
        ProjectStep::Type => Keyboard::new().grid(type_buttons(), 2).row(super::cancel()),
        ProjectStep::Level => Keyboard::new()
            .grid(
                ProjectLevel::ALL.iter().map(|level| {
                    Button::callback(
                        format!("{} {}", level.emoji(), level.label()),
                        Callback::PickLevel(*level),
                    )
                }),
                3,
            )
            .row(super::cancel()),
        ProjectStep::Languages | ProjectStep::Technologies => skip_and_cancel(),
        _ => cancel_only(),
    };
    let text = format!(
        "➕ <b>New project</b> · step {}/{}\n\n{}",
        step.number(),
        ProjectWizard::TOTAL_STEPS,
        step.prompt()
    );
    Screen::new(with_error(error, &text), keyboard)
}

#[must_use]
pub fn category_step(wizard: &CategoryWizard, error: Option<&str>) -> Screen {
    match wizard.step {
        CategoryStep::Confirm => Screen::new(
            with_error(
                error,
                &format!(
                    "📂 <b>New category</b>\n\nName: {}\nDescription: {}\nIcon: {}",
                    escape(&wizard.name),
                    optional(wizard.description.as_ref()),
                    optional(wizard.icon.as_ref()),
                ),
            ),
            confirm_and_cancel(),
        ),
        step => Screen::new(
            with_error(error, &format!("📂 <b>New category</b>\n\n{}", step.prompt())),
            if step == CategoryStep::Name {
                cancel_only()
            } else {
                skip_and_cancel()
            },
        ),
    }
}

/// Broadcast steps; `recipients` is the audience size shown on confirm.
#[must_use]
pub fn broadcast_step(wizard: &BroadcastWizard, recipients: i64, error: Option<&str>) -> Screen {
    match wizard {
        BroadcastWizard::Message => prompt(
            "📢 <b>New broadcast</b>\n\nSend the message text. HTML formatting is allowed.",
            error,
        ),
        BroadcastWizard::Audience { .. } => Screen::new(
            with_error(error, "📢 Who should receive it?"),
            Keyboard::new()
                .grid(
                    BroadcastAudience::ALL.iter().map(|audience| {
                        Button::callback(
                            format!("{} {}", audience.emoji(), audience.label()),
                            Callback::PickAudience(*audience),
                        )
                    }),
                    2,
                )
                .row(super::cancel()),
        ),
        BroadcastWizard::Confirm { message, audience } => Screen::new(
            with_error(
                error,
                &format!(
                    "📢 <b>Send this broadcast?</b>\n\n{} {}: {recipients} recipients\n\n{message}",
                    audience.emoji(),
                    audience.label(),
                ),
            ),
            confirm_and_cancel(),
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_type_step_offers_types() {
        let screen = order_step(&OrderWizard::new(), None);
        let data: Vec<_> = screen.keyboard.callback_data().collect();
        assert!(data.contains(&"wt:diploma"));
        assert!(data.contains(&"cancel"));
        assert!(screen.text.contains("step 1/6"));
    }

    #[test]
    fn test_error_is_shown_above_question() {
        let mut wizard = OrderWizard::new();
        wizard.pick_type(ProjectType::Project).unwrap();
        let screen = order_step(&wizard, Some("Description is too short"));
        assert!(screen.text.starts_with("⚠️ Description is too short"));
        assert!(screen.text.contains(OrderStep::Description.prompt()));
    }

    #[test]
    fn test_review_rating_buttons() {
        let screen = review_step(
            &ReviewWizard::new(studybot_core::ProjectId::new(2)),
            "Chat <server>",
            None,
        );
        let data: Vec<_> = screen.keyboard.callback_data().collect();
        assert_eq!(&data[..5], ["wr:1", "wr:2", "wr:3", "wr:4", "wr:5"]);
        assert!(screen.text.contains("Chat &lt;server&gt;"));
    }

    #[test]
    fn test_broadcast_confirm_shows_count() {
        let wizard = BroadcastWizard::Confirm {
            message: "<b>Sale!</b>".to_string(),
            audience: BroadcastAudience::Buyers,
        };
        let screen = broadcast_step(&wizard, 42, None);
        assert!(screen.text.contains("42 recipients"));
        assert!(screen.keyboard.callback_data().any(|d| d == "ok"));
    }
}
