//! Support section: menu, the user's tickets and ticket details.

use std::fmt::Write as _;

use super::{Screen, back, escape, format_datetime, home, truncate};
use crate::handlers::callback::Callback;
use crate::models::Ticket;
use crate::telegram::{Button, Keyboard};

#[must_use]
pub fn support_menu() -> Screen {
    Screen::new(
        "💬 <b>Support</b>\n\nHave a question? Check the FAQ or write to us.",
        Keyboard::new()
            .row([
                Button::callback("❓ FAQ", Callback::Faq),
                Button::callback("📝 New ticket", Callback::NewTicket),
            ])
            .button("📋 My tickets", Callback::Tickets)
            .row(home()),
    )
}

#[must_use]
pub fn tickets(tickets: &[Ticket]) -> Screen {
    if tickets.is_empty() {
        return Screen::new(
            "📋 You have no tickets.",
            Keyboard::new()
                .button("📝 New ticket", Callback::NewTicket)
                .row(back(Callback::Support)),
        );
    }
    let buttons = tickets.iter().map(|ticket| {
        Button::callback(
            format!(
                "{} #{} {}",
                ticket.status.emoji(),
                ticket.id,
                truncate(&ticket.subject, 30)
            ),
            Callback::Ticket(ticket.id),
        )
    });
    Screen::new(
        "📋 <b>Your tickets</b>",
        Keyboard::new().grid(buttons, 1).row(back(Callback::Support)),
    )
}

/// Ticket body with the admin's answer, shared by user and admin views.
#[must_use]
pub fn ticket_text(ticket: &Ticket) -> String {
    let mut text = format!(
        "🎫 <b>Ticket #{}</b>\n{} {} · {}\n",
        ticket.id,
        ticket.status.emoji(),
        ticket.status.label(),
        format_datetime(&ticket.created_at),
    );
    if let Some(order_id) = ticket.order_id {
        let _ = writeln!(text, "✍️ Order #{order_id}");
    }
    let _ = write!(
        text,
        "\n<b>{}</b>\n{}",
        escape(&ticket.subject),
        escape(&ticket.message)
    );
    if let Some(response) = &ticket.admin_response {
        let _ = write!(text, "\n\n💬 <b>Answer:</b>\n{}", escape(response));
    }
    text
}

#[must_use]
pub fn ticket_card(ticket: &Ticket) -> Screen {
    Screen::new(ticket_text(ticket), Keyboard::new().row(back(Callback::Tickets)))
}

#[must_use]
pub fn ticket_created(ticket: &Ticket) -> Screen {
    Screen::new(
        format!(
            "✅ Ticket #{} created. We'll reply here as soon as possible.",
            ticket.id
        ),
        Keyboard::new()
            .button("📋 My tickets", Callback::Tickets)
            .row(home()),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use studybot_core::{OrderId, TicketId, TicketStatus, UserId};

    use super::*;

    #[test]
    fn test_ticket_text_includes_answer_and_order() {
        let ticket = Ticket {
            id: TicketId::new(4),
            user_id: UserId::new(1),
            order_id: Some(OrderId::new(12)),
            subject: "Refund".to_string(),
            message: "Archive is broken".to_string(),
            status: TicketStatus::InProgress,
            admin_response: Some("Re-uploaded the file".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            closed_at: None,
        };
        let text = ticket_text(&ticket);
        assert!(text.contains("Order #12"));
        assert!(text.contains("Re-uploaded the file"));
        assert!(text.contains("Answered"));
    }
}
