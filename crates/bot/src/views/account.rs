//! The user's own purchases, custom orders and profile.

use std::fmt::Write as _;

use studybot_core::{OrderStatus, Price};

use super::{Screen, back, escape, format_date, format_datetime, home, truncate};
use crate::conversation::ProfileField;
use crate::handlers::callback::Callback;
use crate::models::{Order, OwnedProject, StatusCount, User, UserActivity};
use crate::telegram::{Button, Keyboard};

#[must_use]
pub fn my_orders_menu() -> Screen {
    Screen::new(
        "📦 <b>My orders</b>",
        Keyboard::new()
            .row([
                Button::callback("🛍 Purchases", Callback::Purchases),
                Button::callback("✍️ Custom orders", Callback::Orders),
            ])
            .row(home()),
    )
}

#[must_use]
pub fn purchases(owned: &[OwnedProject]) -> Screen {
    if owned.is_empty() {
        return Screen::new(
            "🛍 You haven't bought anything yet.",
            Keyboard::new()
                .button("🛍 Catalog", Callback::Catalog)
                .row(back(Callback::MyOrders)),
        );
    }
    let mut text = String::from("🛍 <b>Your purchases</b>\n");
    for item in owned {
        let _ = write!(
            text,
            "\n• {}: {} ({})",
            escape(&item.title),
            item.purchase.price,
            format_date(&item.purchase.created_at)
        );
    }
    let buttons = owned.iter().map(|item| {
        let label = if item.has_file { "📥" } else { "📄" };
        Button::callback(
            format!("{label} {}", truncate(&item.title, 35)),
            Callback::Project(item.purchase.project_id),
        )
    });
    Screen::new(
        text,
        Keyboard::new().grid(buttons, 1).row(back(Callback::MyOrders)),
    )
}

#[must_use]
pub fn orders(orders: &[Order]) -> Screen {
    if orders.is_empty() {
        return Screen::new(
            "✍️ You have no custom orders yet.",
            Keyboard::new()
                .button("✍️ Place an order", Callback::NewOrder)
                .row(back(Callback::MyOrders)),
        );
    }
    let buttons = orders.iter().map(|order| {
        Button::callback(
            format!(
                "{} #{} {} · {}",
                order.status.emoji(),
                order.id,
                order.project_type.label(),
                format_date(&order.created_at)
            ),
            Callback::Order(order.id),
        )
    });
    Screen::new(
        "✍️ <b>Your custom orders</b>",
        Keyboard::new().grid(buttons, 1).row(back(Callback::MyOrders)),
    )
}

/// Order details as the customer sees them.
#[must_use]
pub fn order_card(order: &Order) -> Screen {
    let mut text = format!(
        "✍️ <b>Order #{}</b>\n\n{} Status: <b>{}</b>\n📑 Type: {}\n📅 Created: {}\n\n📝 {}\n",
        order.id,
        order.status.emoji(),
        order.status.label(),
        order.project_type.label(),
        format_datetime(&order.created_at),
        escape(&order.description),
    );
    if let Some(technologies) = &order.technologies {
        let _ = write!(text, "\n🛠 Technologies: {}", escape(technologies));
    }
    if let Some(deadline) = &order.deadline {
        let _ = write!(text, "\n⏰ Deadline: {}", escape(deadline));
    }
    if let Some(budget) = &order.budget {
        let _ = write!(text, "\n💵 Budget: {}", escape(budget));
    }
    if let Some(price) = order.price {
        let paid = if order.is_paid { " ✅ paid" } else { "" };
        let _ = write!(text, "\n💰 Price: <b>{price}</b>{paid}");
    }
    if let Some(comment) = &order.admin_comment {
        let _ = write!(text, "\n\n💬 Comment: {}", escape(comment));
    }
    if order.status == OrderStatus::Rejected {
        if let Some(reason) = &order.rejection_reason {
            let _ = write!(text, "\n\n❌ Reason: {}", escape(reason));
        }
    }
    if let Some(completed_at) = &order.completed_at {
        let _ = write!(text, "\n\n🎉 Completed: {}", format_datetime(completed_at));
    }

    let mut keyboard = Keyboard::new();
    if order.awaiting_payment() {
        keyboard = keyboard.button("💳 Pay", Callback::PayOrder(order.id));
    }
    if order.result_available() {
        keyboard = keyboard.button("📥 Download result", Callback::OrderResult(order.id));
    }
    Screen::new(
        text,
        keyboard
            .button("💬 Ask about this order", Callback::OrderTicket(order.id))
            .row(back(Callback::Orders)),
    )
}

#[must_use]
pub fn order_created(order: &Order) -> Screen {
    Screen::new(
        format!(
            "✅ Order #{} received.\n\nWe'll review it and message you here when the status changes.",
            order.id
        ),
        Keyboard::new()
            .button("Open order", Callback::Order(order.id))
            .row(home()),
    )
}

#[must_use]
pub fn order_paid(order: &Order) -> Screen {
    Screen::new(
        format!(
            "✅ Order #{} is paid: {}.\n\nWe'll send you the result as soon as it's ready.",
            order.id,
            order.price.unwrap_or_default()
        ),
        Keyboard::new().row(back(Callback::Order(order.id))),
    )
}

#[must_use]
pub fn profile(user: &User, activity: UserActivity) -> Screen {
    let not_set = "<i>not set</i>";
    let text = format!(
        "👤 <b>Profile</b>\n\n\
         Name: {}\n\
         Username: {}\n\
         Phone: {}\n\
         Email: {}\n\n\
         🛍 Purchases: {}\n\
         ✍️ Custom orders: {}\n\
         📅 With us since {}",
        escape(&user.display_name()),
        user.handle().map_or_else(|| not_set.to_string(), |h| escape(&h)),
        user.phone
            .as_ref()
            .map_or_else(|| not_set.to_string(), |p| escape(p.as_str())),
        user.email
            .as_ref()
            .map_or_else(|| not_set.to_string(), |e| escape(e.as_str())),
        activity.purchases,
        activity.orders,
        format_date(&user.created_at),
    );
    let edits = ProfileField::ALL.iter().map(|field| {
        Button::callback(format!("✏️ {}", field.label()), Callback::EditProfile(*field))
    });
    Screen::new(
        text,
        Keyboard::new()
            .grid(edits, 3)
            .row([
                Button::callback("📊 Statistics", Callback::ProfileStats),
                Button::callback("🎁 Referral", Callback::Referral),
            ])
            .row(home()),
    )
}

#[must_use]
pub fn profile_stats(spent: Price, purchases: i64, statuses: &[StatusCount]) -> Screen {
    let mut text = format!(
        "📊 <b>Your statistics</b>\n\n💰 Total spent: <b>{spent}</b>\n🛍 Purchases: {purchases}\n"
    );
    if statuses.is_empty() {
        text.push_str("\n✍️ No custom orders yet.");
    } else {
        text.push_str("\n✍️ Custom orders:");
        for count in statuses {
            let _ = write!(
                text,
                "\n{} {}: {}",
                count.status.emoji(),
                count.status.label(),
                count.count
            );
        }
    }
    Screen::new(text, Keyboard::new().row(back(Callback::Profile)))
}

#[must_use]
pub fn referral(code: &str, bot_username: Option<&str>, invited: i64) -> Screen {
    let link = bot_username.map_or_else(
        || format!("<code>/start {code}</code>"),
        |bot| format!("https://t.me/{bot}?start={code}"),
    );
    Screen::new(
        format!(
            "🎁 <b>Invite friends</b>\n\nYour code: <code>{code}</code>\nLink: {link}\n\n👥 Friends invited: {invited}"
        ),
        Keyboard::new().row(back(Callback::Profile)),
    )
}

#[must_use]
pub fn profile_prompt(field: ProfileField, error: Option<&str>) -> Screen {
    let mut text = String::new();
    if let Some(error) = error {
        let _ = write!(text, "⚠️ {}\n\n", escape(error));
    }
    text.push_str(field.prompt());
    Screen::new(text, Keyboard::new().row(super::cancel()))
}

#[must_use]
pub fn profile_updated(field: ProfileField) -> Screen {
    Screen::new(
        format!("✅ {} updated.", field.label()),
        Keyboard::new().row(back(Callback::Profile)),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use studybot_core::{OrderId, ProjectType, UserId};

    use super::*;

    fn order(status: OrderStatus, price: Option<i64>) -> Order {
        Order {
            id: OrderId::new(9),
            user_id: UserId::new(1),
            project_type: ProjectType::Diploma,
            description: "Warehouse accounting <script>".to_string(),
            technologies: Some("C#".to_string()),
            deadline: None,
            budget: None,
            contact_info: None,
            result_file_path: None,
            status,
            price: price.map(|p| Price::from_amount(Decimal::from(p))),
            is_paid: false,
            admin_comment: None,
            rejection_reason: Some("Out of scope".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_order_card_pay_button() {
        let screen = order_card(&order(OrderStatus::Accepted, Some(40_000)));
        assert!(screen.keyboard.callback_data().any(|d| d == "pay:9"));
        assert!(screen.text.contains("40 000 ₸"));
        assert!(screen.text.contains("&lt;script&gt;"));

        let screen = order_card(&order(OrderStatus::New, None));
        assert!(!screen.keyboard.callback_data().any(|d| d == "pay:9"));
    }

    #[test]
    fn test_rejection_reason_only_when_rejected() {
        assert!(order_card(&order(OrderStatus::Rejected, None)).text.contains("Out of scope"));
        assert!(!order_card(&order(OrderStatus::Accepted, None)).text.contains("Out of scope"));
    }

    #[test]
    fn test_referral_link() {
        let screen = referral("AB12CD34", Some("study_shop_bot"), 2);
        assert!(screen.text.contains("https://t.me/study_shop_bot?start=AB12CD34"));
        let screen = referral("AB12CD34", None, 0);
        assert!(screen.text.contains("/start AB12CD34"));
    }
}
