//! Main menu, greeting and static help screens.

use studybot_core::ProjectType;

use super::{Screen, escape, home};
use crate::handlers::callback::{AdminAction, Callback};
use crate::models::{User, UserActivity};
use crate::telegram::{Button, Keyboard};

/// Keyboard of the main menu. Admins get an extra row.
#[must_use]
pub fn main_keyboard(is_admin: bool) -> Keyboard {
    let keyboard = Keyboard::new()
        .row([
            Button::callback("🛍 Catalog", Callback::Catalog),
            Button::callback("🛒 Cart", Callback::Cart),
        ])
        .row([
            Button::callback("📦 My orders", Callback::MyOrders),
            Button::callback("✍️ Custom order", Callback::NewOrder),
        ])
        .row([
            Button::callback("👤 Profile", Callback::Profile),
            Button::callback("💬 Support", Callback::Support),
        ]);
    if is_admin {
        keyboard.button("⚙️ Admin panel", Callback::Admin(AdminAction::Home))
    } else {
        keyboard
    }
}

#[must_use]
pub fn main_menu(is_admin: bool) -> Screen {
    Screen::new(
        "🏠 <b>Main menu</b>\n\nChoose a section:",
        main_keyboard(is_admin),
    )
}

/// Reply to `/start`.
#[must_use]
pub fn welcome(user: &User, is_new: bool, activity: UserActivity, is_admin: bool) -> Screen {
    let name = escape(user.first_name.as_deref().unwrap_or("there"));
    let text = if is_new {
        format!(
            "👋 Hi, {name}!\n\n\
             Here you can buy ready-made study projects or order custom work:\n\
             {} diplomas, {} courseworks, {} presentations and {} programming projects.\n\n\
             Open the catalog or place a custom order below.",
            ProjectType::Diploma.emoji(),
            ProjectType::Coursework.emoji(),
            ProjectType::Presentation.emoji(),
            ProjectType::Project.emoji(),
        )
    } else {
        format!(
            "👋 Welcome back, {name}!\n\n\
             🛍 Purchases: {}\n\
             📦 Custom orders: {}",
            activity.purchases, activity.orders
        )
    };
    Screen::new(text, main_keyboard(is_admin))
}

#[must_use]
pub fn help() -> Screen {
    Screen::new(
        "ℹ️ <b>Help</b>\n\n\
         /start - start over\n\
         /menu - main menu\n\
         /cancel - stop what you are filling in\n\
         /help - this message\n\n\
         <b>How buying works</b>\n\
         1. Find a project in the catalog.\n\
         2. Add it to the cart or buy it right away.\n\
         3. Download the files from <i>My orders → Purchases</i>.\n\n\
         <b>Custom work</b>\n\
         Describe the task in <i>Custom order</i>. We will review it, \
         quote a price and keep you posted on every status change.",
        Keyboard::new().row(home()),
    )
}

#[must_use]
pub fn faq() -> Screen {
    Screen::new(
        "❓ <b>Frequently asked questions</b>\n\n\
         <b>How do I get the files after paying?</b>\n\
         They are available right away under <i>My orders → Purchases</i>.\n\n\
         <b>Can I order work on my own topic?</b>\n\
         Yes, use <i>Custom order</i> and describe the requirements.\n\n\
         <b>How long does a custom order take?</b>\n\
         It depends on the volume. We agree on the deadline when the order is accepted.\n\n\
         <b>Can I ask for changes?</b>\n\
         Yes. Open a ticket about the order and describe what to fix.",
        Keyboard::new()
            .button("📝 Ask a question", Callback::NewTicket)
            .row(super::back(Callback::Support)),
    )
}

/// Shown to blocked users instead of any other reply.
#[must_use]
pub fn blocked() -> Screen {
    Screen::text("⛔ Your access to the bot has been restricted. Contact support if you think this is a mistake.")
}

/// Shown when an unfinished form is dropped.
#[must_use]
pub fn cancelled(is_admin: bool) -> Screen {
    Screen::new("❌ Cancelled.", main_keyboard(is_admin))
}

/// Reply to text that is not a command and not part of a dialogue.
#[must_use]
pub fn unknown_input(is_admin: bool) -> Screen {
    Screen::new(
        "🤔 I didn't understand that. Use the buttons below.",
        main_keyboard(is_admin),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_row_only_for_admins() {
        assert!(!main_keyboard(false).callback_data().any(|d| d == "a"));
        assert!(main_keyboard(true).callback_data().any(|d| d == "a"));
    }
}
