//! Catalog, project cards and the cart.

use std::fmt::Write as _;

use studybot_core::{ProjectId, ProjectType};

use super::{PREVIEW_CHARS, Screen, back, escape, home, pager, truncate};
use crate::handlers::callback::Callback;
use crate::models::{
    Cart, CatalogFilter, Category, CategorySummary, Project, Rating, RatingSummary, Review,
};
use crate::services::CheckoutOutcome;
use crate::services::PurchasedItem;
use crate::telegram::{Button, Keyboard};

/// How the viewer relates to a project; decides the card's buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Owned,
    InCart,
    Available,
}

/// Price line with the full price struck through when discounted.
#[must_use]
pub fn price_line(project: &Project) -> String {
    if project.has_discount() {
        format!(
            "<s>{}</s> <b>{}</b>",
            project.price,
            project.effective_price()
        )
    } else {
        format!("<b>{}</b>", project.price)
    }
}

#[must_use]
pub fn catalog_menu() -> Screen {
    let types = ProjectType::ALL.iter().map(|kind| {
        Button::callback(
            format!("{} {}", kind.emoji(), kind.plural_label()),
            Callback::List {
                filter: CatalogFilter::Type(*kind),
                page: 0,
            },
        )
    });
    Screen::new(
        "🛍 <b>Catalog</b>\n\nBrowse by type or by category:",
        Keyboard::new()
            .grid(types, 2)
            .row([
                Button::callback("📂 Categories", Callback::Categories),
                Button::callback(
                    "📋 All projects",
                    Callback::List {
                        filter: CatalogFilter::All,
                        page: 0,
                    },
                ),
            ])
            .button("🔍 Search", Callback::Search)
            .row(home()),
    )
}

#[must_use]
pub fn categories_menu(categories: &[CategorySummary]) -> Screen {
    if categories.is_empty() {
        return Screen::new(
            "📂 There are no categories yet.",
            Keyboard::new().row(back(Callback::Catalog)),
        );
    }
    let buttons = categories.iter().map(|summary| {
        Button::callback(
            format!("{} ({})", summary.category.label(), summary.project_count),
            Callback::List {
                filter: CatalogFilter::Category(summary.category.id),
                page: 0,
            },
        )
    });
    Screen::new(
        "📂 <b>Categories</b>",
        Keyboard::new()
            .grid(buttons, 2)
            .row(back(Callback::Catalog)),
    )
}

/// Heading for a filtered list.
#[must_use]
pub fn list_title(filter: CatalogFilter, category: Option<&Category>) -> String {
    match filter {
        CatalogFilter::All => "📋 All projects".to_string(),
        CatalogFilter::Type(kind) => format!("{} {}", kind.emoji(), kind.plural_label()),
        CatalogFilter::Category(_) => category.map_or_else(
            || "📂 Category".to_string(),
            |c| format!("📂 {}", escape(&c.label())),
        ),
    }
}

/// One page of catalog projects.
#[must_use]
pub fn project_list(
    title: &str,
    filter: CatalogFilter,
    projects: &[Project],
    page: u32,
    total: i64,
) -> Screen {
    let back_to = match filter {
        CatalogFilter::Category(_) => Callback::Categories,
        CatalogFilter::All | CatalogFilter::Type(_) => Callback::Catalog,
    };
    if projects.is_empty() {
        return Screen::new(
            format!("<b>{title}</b>\n\nNothing here yet. Check back later!"),
            Keyboard::new().row(back(back_to)),
        );
    }

    let mut text = format!("<b>{title}</b>\n\nFound: {total}\n");
    for project in projects {
        let _ = write!(
            text,
            "\n{} <b>{}</b>\n{}\n💰 {}\n",
            project.popularity().emoji(),
            escape(&project.title),
            escape(&truncate(&project.description, PREVIEW_CHARS)),
            price_line(project),
        );
    }

    let buttons = projects.iter().map(|project| {
        Button::callback(
            format!("{} {}", project.project_type.emoji(), truncate(&project.title, 40)),
            Callback::Project(project.id),
        )
    });
    Screen::new(
        text,
        Keyboard::new()
            .grid(buttons, 1)
            .row(pager(page, total, |page| Callback::List { filter, page }))
            .row(back(back_to)),
    )
}

/// Full card of a project.
#[must_use]
pub fn project_card(
    project: &Project,
    category: Option<&Category>,
    rating: RatingSummary,
    reviews: &[Review],
    state: CardState,
) -> Screen {
    let mut text = format!(
        "{} <b>{}</b>\n\n{}\n\n",
        project.project_type.emoji(),
        escape(&project.title),
        escape(&project.description),
    );
    let _ = writeln!(text, "📑 Type: {}", project.project_type.label());
    let _ = writeln!(
        text,
        "{} Level: {}",
        project.level.emoji(),
        project.level.label()
    );
    if let Some(category) = category {
        let _ = writeln!(text, "📂 Category: {}", escape(&category.label()));
    }
    if let Some(languages) = &project.programming_languages {
        let _ = writeln!(text, "💻 Languages: {}", escape(languages));
    }
    if let Some(technologies) = &project.technologies {
        let _ = writeln!(text, "🛠 Technologies: {}", escape(technologies));
    }
    if let Some(average) = rating.average {
        let _ = writeln!(text, "⭐ Rating: {average:.1} ({} reviews)", rating.count);
    }
    for review in reviews {
        if let Some(comment) = &review.comment {
            let _ = writeln!(
                text,
                "   {} <i>{}</i>",
                review.rating.stars(),
                escape(&truncate(comment, PREVIEW_CHARS))
            );
        }
    }
    let _ = writeln!(
        text,
        "👁 Views: {}  🛒 Purchases: {}",
        project.views_count, project.purchases_count
    );
    let _ = write!(text, "\n💰 Price: {}", price_line(project));

    let mut keyboard = Keyboard::new();
    keyboard = match state {
        CardState::Owned => keyboard
            .row([
                Button::callback("📥 Download", Callback::Download(project.id)),
                Button::callback("⭐ Rate", Callback::Rate(project.id)),
            ]),
        CardState::InCart => keyboard
            .row([
                Button::callback(
                    "➖ Remove from cart",
                    Callback::RemoveFromCart {
                        project_id: project.id,
                        in_cart: false,
                    },
                ),
                Button::callback("🛒 Go to cart", Callback::Cart),
            ]),
        CardState::Available => keyboard.row([
            Button::callback("🛒 Add to cart", Callback::AddToCart(project.id)),
            Button::callback("⚡ Buy now", Callback::BuyNow(project.id)),
        ]),
    };
    if let Some(demo) = &project.demo_url {
        keyboard = keyboard.row([Button::url("🌐 Demo", demo.clone())]);
    }
    Screen::new(
        text,
        keyboard.row(back(Callback::List {
            filter: CatalogFilter::Type(project.project_type),
            page: 0,
        })),
    )
}

#[must_use]
pub fn cart(cart: &Cart) -> Screen {
    if cart.is_empty() {
        return Screen::new(
            "🛒 Your cart is empty.",
            Keyboard::new()
                .button("🛍 Catalog", Callback::Catalog)
                .row(home()),
        );
    }

    let mut text = String::from("🛒 <b>Cart</b>\n");
    for (i, line) in cart.lines.iter().enumerate() {
        if line.is_active {
            let _ = write!(
                text,
                "\n{}. {}: {}",
                i + 1,
                escape(&line.title),
                line.effective_price()
            );
        } else {
            let _ = write!(
                text,
                "\n{}. <s>{}</s> (no longer available)",
                i + 1,
                escape(&line.title)
            );
        }
    }
    let _ = write!(text, "\n\n💰 <b>Total: {}</b>", cart.total());

    let removals = cart.lines.iter().map(|line| {
        Button::callback(
            format!("❌ {}", truncate(&line.title, 30)),
            Callback::RemoveFromCart {
                project_id: line.project_id,
                in_cart: true,
            },
        )
    });
    let mut keyboard = Keyboard::new().grid(removals, 1);
    if cart.available().next().is_some() {
        keyboard = keyboard.button("💳 Checkout", Callback::Checkout);
    }
    Screen::new(
        text,
        keyboard
            .button("🗑 Clear cart", Callback::ClearCart)
            .row(home()),
    )
}

#[must_use]
pub fn checkout_done(outcome: &CheckoutOutcome) -> Screen {
    let mut text = String::from("✅ <b>Payment successful</b>\n");
    for item in &outcome.purchased {
        let _ = write!(text, "\n• {}: {}", escape(&item.title), item.price);
    }
    let _ = write!(text, "\n\n💰 Paid: <b>{}</b>", outcome.total());
    if !outcome.already_owned.is_empty() {
        let _ = write!(
            text,
            "\n\nSkipped, already yours: {}",
            escape(&outcome.already_owned.join(", "))
        );
    }
    if !outcome.unavailable.is_empty() {
        let _ = write!(
            text,
            "\n\nSkipped, no longer available: {}",
            escape(&outcome.unavailable.join(", "))
        );
    }
    text.push_str("\n\nDownload the files from <i>My orders → Purchases</i>.");

    let downloads = outcome.purchased.iter().map(|item| {
        Button::callback(
            format!("📥 {}", truncate(&item.title, 30)),
            Callback::Download(item.project_id),
        )
    });
    Screen::new(text, Keyboard::new().grid(downloads, 1).row(home()))
}

#[must_use]
pub fn buy_done(item: &PurchasedItem) -> Screen {
    Screen::new(
        format!(
            "✅ <b>Payment successful</b>\n\n{}: {}\n\nThe files are ready to download.",
            escape(&item.title),
            item.price
        ),
        Keyboard::new()
            .button("📥 Download", Callback::Download(item.project_id))
            .row(home()),
    )
}

#[must_use]
pub fn review_saved(project_id: ProjectId, rating: Rating) -> Screen {
    Screen::new(
        format!("🙏 Thanks for the review! {}", rating.stars()),
        Keyboard::new().row(back(Callback::Project(project_id))),
    )
}

#[must_use]
pub fn search_prompt() -> Screen {
    Screen::new(
        "🔍 Send a word to search for in titles, descriptions and technologies.",
        Keyboard::new().row(super::cancel()),
    )
}

#[must_use]
pub fn search_results(query: &str, projects: &[Project]) -> Screen {
    if projects.is_empty() {
        return Screen::new(
            format!("🔍 Nothing found for «{}».", escape(query)),
            Keyboard::new()
                .button("🔍 Search again", Callback::Search)
                .row(back(Callback::Catalog)),
        );
    }
    let buttons = projects.iter().map(|project| {
        Button::callback(
            format!("{} {} · {}", project.project_type.emoji(), truncate(&project.title, 30), project.effective_price()),
            Callback::Project(project.id),
        )
    });
    Screen::new(
        format!(
            "🔍 Results for «{}»: {}",
            escape(query),
            projects.len()
        ),
        Keyboard::new()
            .grid(buttons, 1)
            .row(back(Callback::Catalog)),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use studybot_core::{CategoryId, Price, ProjectId, ProjectLevel};

    use super::*;

    fn project(id: i32, price: i64, discount: Option<i64>) -> Project {
        Project {
            id: ProjectId::new(id),
            title: format!("Hotel booking <{id}>"),
            description: "Booking system with rooms, guests and invoices.".to_string(),
            category_id: CategoryId::new(1),
            project_type: ProjectType::Coursework,
            level: ProjectLevel::Intermediate,
            technologies: Some("Django".to_string()),
            programming_languages: Some("Python".to_string()),
            price: Price::from_amount(Decimal::from(price)),
            discount_price: discount.map(|d| Price::from_amount(Decimal::from(d))),
            file_path: None,
            image_path: None,
            demo_url: None,
            views_count: 10,
            purchases_count: 7,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_line_strikes_through_discount() {
        assert_eq!(
            price_line(&project(1, 8000, Some(6500))),
            "<s>8 000 ₸</s> <b>6 500 ₸</b>"
        );
        assert_eq!(price_line(&project(1, 8000, None)), "<b>8 000 ₸</b>");
    }

    #[test]
    fn test_card_buttons_follow_state() {
        let p = project(3, 8000, None);
        let owned = project_card(&p, None, RatingSummary::default(), &[], CardState::Owned);
        let data: Vec<_> = owned.keyboard.callback_data().collect();
        assert!(data.contains(&"dl:3"));
        assert!(!data.contains(&"ca:3"));

        let available = project_card(&p, None, RatingSummary::default(), &[], CardState::Available);
        let data: Vec<_> = available.keyboard.callback_data().collect();
        assert!(data.contains(&"ca:3"));
        assert!(data.contains(&"buy:3"));

        let in_cart = project_card(&p, None, RatingSummary::default(), &[], CardState::InCart);
        assert!(in_cart.keyboard.callback_data().any(|d| d == "cr:3"));
    }

    #[test]
    fn test_list_escapes_and_marks_popularity() {
        let projects = [project(1, 8000, None)];
        let screen = project_list("All", CatalogFilter::All, &projects, 0, 1);
        assert!(screen.text.contains("Hotel booking &lt;1&gt;"));
        assert!(screen.text.contains("🔥"));
        assert!(!screen.keyboard.callback_data().any(|d| d == "noop"));
    }

    #[test]
    fn test_list_pager_keeps_filter() {
        let projects = [project(1, 8000, None)];
        let filter = CatalogFilter::Type(ProjectType::Diploma);
        let screen = project_list("Diplomas", filter, &projects, 0, 12);
        assert!(screen.keyboard.callback_data().any(|d| d == "ls:t:diploma:1"));
    }
}
