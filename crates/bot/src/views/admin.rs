//! Admin panel screens and the notifications admins send or receive.

use std::fmt::Write as _;

use studybot_core::{AdminRole, AdminSection, OrderId, OrderStatus};

use super::{
    Screen, back, escape, format_date, format_datetime, pager, support::ticket_text, truncate,
};
use crate::conversation::CategoryField;
use crate::handlers::callback::{AdminAction, Callback};
use crate::models::{
    Broadcast, CategorySummary, DashboardStats, Order, Project, ProjectField, Ticket, User,
    UserActivity,
};
use crate::telegram::{Button, Keyboard};
use crate::views::catalog::price_line;

fn admin(action: AdminAction) -> Callback {
    Callback::Admin(action)
}

fn back_to(action: AdminAction) -> [Button; 1] {
    back(admin(action))
}

// =============================================================================
// Home and dashboard
// =============================================================================

#[must_use]
pub fn home(role: AdminRole) -> Screen {
    let sections = [
        (AdminSection::Stats, "📊 Statistics", AdminAction::Stats),
        (AdminSection::Catalog, "🗂 Projects", AdminAction::Projects { page: 0 }),
        (AdminSection::Categories, "📂 Categories", AdminAction::Categories),
        (AdminSection::Orders, "✍️ Orders", AdminAction::OrdersMenu),
        (AdminSection::Tickets, "🎫 Tickets", AdminAction::Tickets),
        (AdminSection::Users, "👥 Users", AdminAction::Users { blocked_only: false, page: 0 }),
        (AdminSection::Broadcasts, "📢 Broadcasts", AdminAction::Broadcasts),
    ];
    let buttons = sections
        .into_iter()
        .filter(|(section, _, _)| role.can(*section))
        .map(|(_, label, action)| Button::callback(label, admin(action)));
    Screen::new(
        format!("⚙️ <b>Admin panel</b>\n\nRole: {}", role.label()),
        Keyboard::new().grid(buttons, 2).row(super::home()),
    )
}

#[must_use]
pub fn dashboard(stats: &DashboardStats) -> Screen {
    Screen::new(
        format!(
            "📊 <b>Statistics</b>\n\n\
             👥 Users: {} (+{} this week, {} blocked)\n\
             🗂 Active projects: {}\n\
             📂 Categories: {}\n\n\
             ✍️ New orders: {}\n\
             ⚙️ In work: {}\n\
             🎉 Completed: {}\n\n\
             🛍 Purchases: {}\n\
             💰 Revenue: {}\n\
             🎫 Open tickets: {}",
            stats.total_users,
            stats.new_users_week,
            stats.blocked_users,
            stats.active_projects,
            stats.categories,
            stats.new_orders,
            stats.orders_in_work,
            stats.completed_orders,
            stats.purchases,
            studybot_core::Price::from_amount(stats.revenue),
            stats.open_tickets,
        ),
        Keyboard::new()
            .button("🔄 Refresh", admin(AdminAction::Stats))
            .row(back_to(AdminAction::Home)),
    )
}

// =============================================================================
// Projects
// =============================================================================

#[must_use]
pub fn projects(projects: &[Project], page: u32, total: i64) -> Screen {
    let buttons = projects.iter().map(|project| {
        let state = if project.is_active { "🟢" } else { "⚪" };
        Button::callback(
            format!("{state} #{} {}", project.id, truncate(&project.title, 35)),
            admin(AdminAction::Project(project.id)),
        )
    });
    Screen::new(
        format!("🗂 <b>Projects</b>\n\nTotal: {total}"),
        Keyboard::new()
            .button("➕ Add project", admin(AdminAction::NewProject))
            .grid(buttons, 1)
            .row(pager(page, total, |page| admin(AdminAction::Projects { page })))
            .row(back_to(AdminAction::Home)),
    )
}

#[must_use]
pub fn project(project: &Project, category: Option<&str>) -> Screen {
    let mut text = format!(
        "🗂 <b>#{} {}</b>\n\n{}\n\n",
        project.id,
        escape(&project.title),
        escape(&truncate(&project.description, 500)),
    );
    let _ = writeln!(
        text,
        "📂 {} · {} {} · {} {}",
        category.map_or_else(|| "—".to_string(), escape),
        project.project_type.emoji(),
        project.project_type.label(),
        project.level.emoji(),
        project.level.label(),
    );
    let _ = writeln!(text, "💰 {}", price_line(project));
    if let Some(languages) = &project.programming_languages {
        let _ = writeln!(text, "💻 {}", escape(languages));
    }
    if let Some(technologies) = &project.technologies {
        let _ = writeln!(text, "🛠 {}", escape(technologies));
    }
    if let Some(demo) = &project.demo_url {
        let _ = writeln!(text, "🌐 {}", escape(demo));
    }
    let _ = write!(
        text,
        "📎 File: {}\n👁 {} · 🛒 {}\n{}",
        if project.file_path.is_some() { "attached" } else { "none" },
        project.views_count,
        project.purchases_count,
        if project.is_active { "🟢 Visible in catalog" } else { "⚪ Hidden" },
    );

    let edits = ProjectField::ALL.iter().map(|field| {
        Button::callback(
            format!("✏️ {}", field.label()),
            admin(AdminAction::EditProject {
                project_id: project.id,
                field: *field,
            }),
        )
    });
    let toggle = if project.is_active { "🙈 Hide" } else { "👁 Show" };
    Screen::new(
        text,
        Keyboard::new()
            .grid(edits, 2)
            .row([
                Button::callback(toggle, admin(AdminAction::ToggleProject(project.id))),
                Button::callback("📎 Upload file", admin(AdminAction::AttachFile(project.id))),
            ])
            .button("🗑 Delete", admin(AdminAction::DeleteProject(project.id)))
            .row(back_to(AdminAction::Projects { page: 0 })),
    )
}

#[must_use]
pub fn confirm_delete_project(project: &Project) -> Screen {
    Screen::new(
        format!(
            "🗑 Delete project «{}»?\n\nThis cannot be undone.",
            escape(&project.title)
        ),
        Keyboard::new().row([
            Button::callback(
                "✅ Yes, delete",
                admin(AdminAction::ConfirmDeleteProject(project.id)),
            ),
            Button::callback("❌ No", admin(AdminAction::Project(project.id))),
        ]),
    )
}

// =============================================================================
// Orders
// =============================================================================

#[must_use]
pub fn orders_menu() -> Screen {
    let statuses = OrderStatus::ALL.iter().map(|status| {
        Button::callback(
            format!("{} {}", status.emoji(), status.label()),
            admin(AdminAction::Orders {
                status: Some(*status),
                page: 0,
            }),
        )
    });
    Screen::new(
        "✍️ <b>Orders</b>\n\nChoose a status:",
        Keyboard::new()
            .button(
                "📋 All orders",
                admin(AdminAction::Orders {
                    status: None,
                    page: 0,
                }),
            )
            .grid(statuses, 2)
            .row(back_to(AdminAction::Home)),
    )
}

#[must_use]
pub fn orders(status: Option<OrderStatus>, orders: &[Order], page: u32, total: i64) -> Screen {
    let title = status.map_or_else(
        || "📋 All orders".to_string(),
        |s| format!("{} {}", s.emoji(), s.label()),
    );
    let buttons = orders.iter().map(|order| {
        Button::callback(
            format!(
                "{} #{} {} · {}",
                order.status.emoji(),
                order.id,
                order.project_type.label(),
                format_date(&order.created_at)
            ),
            admin(AdminAction::Order(order.id)),
        )
    });
    let text = if orders.is_empty() {
        format!("<b>{title}</b>\n\nNo orders.")
    } else {
        format!("<b>{title}</b>\n\nTotal: {total}")
    };
    Screen::new(
        text,
        Keyboard::new()
            .grid(buttons, 1)
            .row(pager(page, total, |page| admin(AdminAction::Orders { status, page })))
            .row(back_to(AdminAction::OrdersMenu)),
    )
}

#[must_use]
pub fn order(order: &Order, customer: Option<&User>) -> Screen {
    let mut text = format!(
        "✍️ <b>Order #{}</b>\n{} {} · {}\n",
        order.id,
        order.status.emoji(),
        order.status.label(),
        format_datetime(&order.created_at),
    );
    if let Some(customer) = customer {
        let _ = writeln!(
            text,
            "👤 {} {} (<code>{}</code>)",
            escape(&customer.display_name()),
            customer.handle().map(|h| escape(&h)).unwrap_or_default(),
            customer.telegram_id,
        );
    }
    let _ = write!(
        text,
        "\n📑 {}\n📝 {}\n",
        order.project_type.label(),
        escape(&order.description)
    );
    for (label, value) in [
        ("🛠 Technologies", &order.technologies),
        ("⏰ Deadline", &order.deadline),
        ("💵 Budget", &order.budget),
        ("📞 Contact", &order.contact_info),
        ("💬 Comment", &order.admin_comment),
        ("❌ Rejection", &order.rejection_reason),
    ] {
        if let Some(value) = value {
            let _ = write!(text, "\n{label}: {}", escape(value));
        }
    }
    let price = order.price.map_or_else(|| "not set".to_string(), |p| p.to_string());
    let paid = if order.is_paid { " ✅ paid" } else { "" };
    let _ = write!(text, "\n\n💰 Price: {price}{paid}");
    if order.result_file_path.is_some() {
        text.push_str("\n📎 Result uploaded");
    }

    let transitions = order.status.next_statuses().iter().map(|status| {
        Button::callback(
            format!("{} {}", status.emoji(), status.label()),
            admin(AdminAction::SetStatus {
                order_id: order.id,
                status: *status,
            }),
        )
    });
    let mut keyboard = Keyboard::new().grid(transitions, 2);
    if order.status.is_open() {
        keyboard = keyboard.row([
            Button::callback("💰 Set price", admin(AdminAction::SetPrice(order.id))),
            Button::callback("💬 Comment", admin(AdminAction::Comment(order.id))),
        ]);
    }
    if order.status != OrderStatus::Rejected {
        keyboard = keyboard.button("📎 Upload result", admin(AdminAction::UploadResult(order.id)));
    }
    Screen::new(
        text,
        keyboard.row(back_to(AdminAction::Orders {
            status: Some(order.status),
            page: 0,
        })),
    )
}

// =============================================================================
// Broadcasts
// =============================================================================

#[must_use]
pub fn broadcasts_menu() -> Screen {
    Screen::new(
        "📢 <b>Broadcasts</b>",
        Keyboard::new()
            .row([
                Button::callback("➕ New broadcast", admin(AdminAction::NewBroadcast)),
                Button::callback("🕘 History", admin(AdminAction::BroadcastHistory)),
            ])
            .row(back_to(AdminAction::Home)),
    )
}

#[must_use]
pub fn broadcast_history(broadcasts: &[Broadcast]) -> Screen {
    let mut text = String::from("🕘 <b>Recent broadcasts</b>\n");
    if broadcasts.is_empty() {
        text.push_str("\nNothing sent yet.");
    }
    for broadcast in broadcasts {
        let status = broadcast.sent_at.as_ref().map_or_else(
            || "⏳ sending".to_string(),
            |at| format!("✅ {}/{} · {}", broadcast.successful, broadcast.total_sent, format_datetime(at)),
        );
        let _ = write!(
            text,
            "\n#{} {} {}\n{}\n{}\n",
            broadcast.id,
            broadcast.audience.emoji(),
            broadcast.audience.label(),
            status,
            escape(&truncate(&broadcast.message, 80)),
        );
    }
    Screen::new(text, Keyboard::new().row(back_to(AdminAction::Broadcasts)))
}

#[must_use]
pub fn broadcast_started(recipients: i64) -> Screen {
    Screen::new(
        format!("📤 Sending to {recipients} recipients. I'll report when it's done."),
        Keyboard::new().row(back_to(AdminAction::Broadcasts)),
    )
}

/// Report sent to the admin when a broadcast finishes.
#[must_use]
pub fn broadcast_report(broadcast: &Broadcast) -> String {
    format!(
        "📢 <b>Broadcast #{} finished</b>\n\n📤 Sent: {}\n✅ Delivered: {}\n❌ Failed: {}",
        broadcast.id, broadcast.total_sent, broadcast.successful, broadcast.failed
    )
}

// =============================================================================
// Categories
// =============================================================================

#[must_use]
pub fn categories(categories: &[CategorySummary]) -> Screen {
    let buttons = categories.iter().map(|summary| {
        Button::callback(
            format!("{} ({})", summary.category.label(), summary.project_count),
            admin(AdminAction::Category(summary.category.id)),
        )
    });
    let text = if categories.is_empty() {
        "📂 <b>Categories</b>\n\nNo categories yet."
    } else {
        "📂 <b>Categories</b>"
    };
    Screen::new(
        text,
        Keyboard::new()
            .button("➕ Add category", admin(AdminAction::NewCategory))
            .grid(buttons, 2)
            .row(back_to(AdminAction::Home)),
    )
}

#[must_use]
pub fn category(summary: &CategorySummary) -> Screen {
    let category = &summary.category;
    let text = format!(
        "📂 <b>{}</b>\n\n{}\n\nIcon: {}\nProjects: {}\nCreated: {}",
        escape(&category.name),
        category
            .description
            .as_deref()
            .map_or_else(|| "<i>No description</i>".to_string(), escape),
        category.icon.as_deref().unwrap_or("—"),
        summary.project_count,
        format_date(&category.created_at),
    );
    let edits = CategoryField::ALL.iter().map(|field| {
        Button::callback(
            format!("✏️ {}", field.label()),
            admin(AdminAction::EditCategory {
                category_id: category.id,
                field: *field,
            }),
        )
    });
    Screen::new(
        text,
        Keyboard::new()
            .grid(edits, 3)
            .button("🗑 Delete", admin(AdminAction::DeleteCategory(category.id)))
            .row(back_to(AdminAction::Categories)),
    )
}

#[must_use]
pub fn confirm_delete_category(summary: &CategorySummary) -> Screen {
    Screen::new(
        format!(
            "🗑 Delete category «{}»?",
            escape(&summary.category.name)
        ),
        Keyboard::new().row([
            Button::callback(
                "✅ Yes, delete",
                admin(AdminAction::ConfirmDeleteCategory(summary.category.id)),
            ),
            Button::callback("❌ No", admin(AdminAction::Category(summary.category.id))),
        ]),
    )
}

// =============================================================================
// Users
// =============================================================================

fn user_button(user: &User) -> Button {
    let state = if user.is_blocked { "🚫" } else { "👤" };
    Button::callback(
        format!("{state} {} · {}", truncate(&user.display_name(), 30), user.telegram_id),
        admin(AdminAction::User(user.id)),
    )
}

#[must_use]
pub fn users(users: &[User], blocked_only: bool, page: u32, total: i64) -> Screen {
    let title = if blocked_only { "🚫 Blocked users" } else { "👥 Users" };
    let other = if blocked_only {
        ("👥 All users", AdminAction::Users { blocked_only: false, page: 0 })
    } else {
        ("🚫 Blocked", AdminAction::Users { blocked_only: true, page: 0 })
    };
    Screen::new(
        format!("<b>{title}</b>\n\nTotal: {total}"),
        Keyboard::new()
            .row([
                Button::callback("🔍 Search", admin(AdminAction::SearchUsers)),
                Button::callback(other.0, admin(other.1)),
            ])
            .grid(users.iter().map(user_button), 1)
            .row(pager(page, total, |page| {
                admin(AdminAction::Users { blocked_only, page })
            }))
            .row(back_to(AdminAction::Home)),
    )
}

#[must_use]
pub fn user_search_results(query: &str, users: &[User]) -> Screen {
    let text = if users.is_empty() {
        format!("🔍 No users match «{}».", escape(query))
    } else {
        format!("🔍 Users matching «{}»:", escape(query))
    };
    Screen::new(
        text,
        Keyboard::new()
            .grid(users.iter().map(user_button), 1)
            .row(back_to(AdminAction::Users { blocked_only: false, page: 0 })),
    )
}

#[must_use]
pub fn user(user: &User, activity: UserActivity, orders: &[Order]) -> Screen {
    let mut text = format!(
        "👤 <b>{}</b>\n\nTelegram id: <code>{}</code>\nUsername: {}\nPhone: {}\nEmail: {}\n\
         Registered: {}\nLast active: {}\n\n🛍 Purchases: {}\n✍️ Orders: {}\n{}",
        escape(&user.display_name()),
        user.telegram_id,
        user.handle().map_or_else(|| "—".to_string(), |h| escape(&h)),
        user.phone.as_ref().map_or("—", |p| p.as_str()),
        user.email.as_ref().map_or("—", |e| e.as_str()),
        format_date(&user.created_at),
        format_datetime(&user.last_active_at),
        activity.purchases,
        activity.orders,
        if user.is_blocked { "🚫 Blocked" } else { "✅ Active" },
    );
    for order in orders.iter().take(5) {
        let _ = write!(
            text,
            "\n{} #{} {}",
            order.status.emoji(),
            order.id,
            order.project_type.label()
        );
    }
    let toggle = if user.is_blocked {
        ("✅ Unblock", false)
    } else {
        ("🚫 Block", true)
    };
    Screen::new(
        text,
        Keyboard::new()
            .button(
                toggle.0,
                admin(AdminAction::SetBlocked {
                    user_id: user.id,
                    blocked: toggle.1,
                }),
            )
            .row(back_to(AdminAction::Users { blocked_only: false, page: 0 })),
    )
}

// =============================================================================
// Tickets
// =============================================================================

#[must_use]
pub fn tickets(tickets: &[Ticket], open_total: i64) -> Screen {
    let buttons = tickets.iter().map(|ticket| {
        Button::callback(
            format!(
                "{} #{} {}",
                ticket.status.emoji(),
                ticket.id,
                truncate(&ticket.subject, 30)
            ),
            admin(AdminAction::Ticket(ticket.id)),
        )
    });
    Screen::new(
        format!("🎫 <b>Open tickets</b>: {open_total}"),
        Keyboard::new()
            .grid(buttons, 1)
            .row(back_to(AdminAction::Home)),
    )
}

#[must_use]
pub fn ticket(ticket: &Ticket, author: Option<&User>) -> Screen {
    let mut text = ticket_text(ticket);
    if let Some(author) = author {
        let _ = write!(
            text,
            "\n\n👤 {} (<code>{}</code>)",
            escape(&author.display_name()),
            author.telegram_id
        );
    }
    let mut keyboard = Keyboard::new();
    if ticket.closed_at.is_none() {
        keyboard = keyboard.row([
            Button::callback("💬 Reply", admin(AdminAction::ReplyTicket(ticket.id))),
            Button::callback("✅ Close", admin(AdminAction::CloseTicket(ticket.id))),
        ]);
    }
    Screen::new(text, keyboard.row(back_to(AdminAction::Tickets)))
}

// =============================================================================
// Notifications
// =============================================================================

/// Button opening an order in the admin panel.
#[must_use]
pub fn order_link(order_id: OrderId) -> Keyboard {
    Keyboard::new().button("Open", admin(AdminAction::Order(order_id)))
}

/// Sent to admins when a custom order arrives.
#[must_use]
pub fn new_order_alert(order: &Order, customer: &User) -> (String, Keyboard) {
    (
        format!(
            "🆕 <b>New order #{}</b>\n\n👤 {}\n📑 {}\n📝 {}",
            order.id,
            escape(&customer.display_name()),
            order.project_type.label(),
            escape(&truncate(&order.description, 300)),
        ),
        order_link(order.id),
    )
}

/// Sent to admins when a ticket is opened.
#[must_use]
pub fn new_ticket_alert(ticket: &Ticket, author: &User) -> (String, Keyboard) {
    (
        format!(
            "🎫 <b>New ticket #{}</b>\n\n👤 {}\n<b>{}</b>\n{}",
            ticket.id,
            escape(&author.display_name()),
            escape(&ticket.subject),
            escape(&truncate(&ticket.message, 300)),
        ),
        Keyboard::new().button("Open", admin(AdminAction::Ticket(ticket.id))),
    )
}

/// Sent to the customer on every status change.
#[must_use]
pub fn order_status_notice(order: &Order) -> (String, Keyboard) {
    let mut text = format!(
        "{} Order #{} is now <b>{}</b>.",
        order.status.emoji(),
        order.id,
        order.status.label()
    );
    if order.status == OrderStatus::Rejected {
        if let Some(reason) = &order.rejection_reason {
            let _ = write!(text, "\n\nReason: {}", escape(reason));
        }
    }
    (
        text,
        Keyboard::new().button("Open order", Callback::Order(order.id)),
    )
}

/// Sent to the customer when the price or a comment is set.
#[must_use]
pub fn order_update_notice(order: &Order, what: &str) -> (String, Keyboard) {
    (
        format!("✍️ Order #{}: {what}", order.id),
        Keyboard::new().button("Open order", Callback::Order(order.id)),
    )
}

/// Sent to the ticket author when an admin replies.
#[must_use]
pub fn ticket_reply_notice(ticket: &Ticket) -> (String, Keyboard) {
    (
        format!(
            "💬 <b>Answer to ticket #{}</b>\n\n{}",
            ticket.id,
            escape(ticket.admin_response.as_deref().unwrap_or_default())
        ),
        Keyboard::new().button("Open ticket", Callback::Ticket(ticket.id)),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use studybot_core::{OrderId, ProjectType, UserId};

    use super::*;

    fn sample_order(status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(3),
            user_id: UserId::new(1),
            project_type: ProjectType::Project,
            description: "Telegram bot for a dentist".to_string(),
            technologies: None,
            deadline: None,
            budget: None,
            contact_info: None,
            result_file_path: None,
            status,
            price: None,
            is_paid: false,
            admin_comment: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_home_respects_role() {
        let content: Vec<_> = home(AdminRole::ContentManager)
            .keyboard
            .callback_data()
            .map(str::to_string)
            .collect();
        assert!(content.contains(&"a:pl:0".to_string()));
        assert!(!content.contains(&"a:b".to_string()));

        let manager: Vec<_> = home(AdminRole::Manager)
            .keyboard
            .callback_data()
            .map(str::to_string)
            .collect();
        assert!(manager.contains(&"a:om".to_string()));
        assert!(!manager.contains(&"a:cl".to_string()));
    }

    #[test]
    fn test_order_buttons_follow_transitions() {
        let screen = order(&sample_order(OrderStatus::New), None);
        let data: Vec<_> = screen.keyboard.callback_data().collect();
        assert!(data.contains(&"a:os:3:under_review"));
        assert!(data.contains(&"a:os:3:rejected"));
        assert!(!data.contains(&"a:os:3:completed"));

        let screen = order(&sample_order(OrderStatus::Completed), None);
        assert!(!screen.keyboard.callback_data().any(|d| d.starts_with("a:os:")));
        assert!(!screen.keyboard.callback_data().any(|d| d == "a:op:3"));
    }
}
