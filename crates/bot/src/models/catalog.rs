//! Catalog models: categories, projects, cart lines and reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studybot_core::{
    CartItemId, CategoryId, Price, ProjectId, ProjectLevel, ProjectType, ReviewId, UserId,
};

/// Price actually charged: the discount when there is a positive one, else the full price.
#[must_use]
pub fn effective_price(price: Price, discount: Option<Price>) -> Price {
    match discount {
        Some(discount) if !discount.is_zero() && discount.amount < price.amount => discount,
        _ => price,
    }
}

// =============================================================================
// Categories
// =============================================================================

/// A catalog section such as "Python" or "Web".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    /// Emoji shown before the name.
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Name with its icon, e.g. `🐍 Python`.
    #[must_use]
    pub fn label(&self) -> String {
        self.icon
            .as_deref()
            .map_or_else(|| self.name.clone(), |icon| format!("{icon} {}", self.name))
    }
}

/// A category together with the number of projects filed under it.
#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub category: Category,
    pub project_count: i64,
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// A single category field change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryUpdate {
    Name(String),
    Description(Option<String>),
    Icon(Option<String>),
}

// =============================================================================
// Projects
// =============================================================================

/// A ready-made deliverable offered for direct purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub project_type: ProjectType,
    pub level: ProjectLevel,
    pub technologies: Option<String>,
    pub programming_languages: Option<String>,
    pub price: Price,
    pub discount_price: Option<Price>,
    /// Stored deliverable, relative to the uploads directory.
    pub file_path: Option<String>,
    pub image_path: Option<String>,
    pub demo_url: Option<String>,
    pub views_count: i32,
    pub purchases_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    #[must_use]
    pub fn effective_price(&self) -> Price {
        effective_price(self.price, self.discount_price)
    }

    #[must_use]
    pub fn has_discount(&self) -> bool {
        self.effective_price() != self.price
    }

    #[must_use]
    pub fn popularity(&self) -> Popularity {
        Popularity::from_purchases(self.purchases_count)
    }
}

/// Marker shown next to a project in catalog lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popularity {
    /// More than five purchases.
    Hot,
    /// At least one purchase.
    Sold,
    /// Never purchased.
    Fresh,
}

impl Popularity {
    #[must_use]
    pub const fn from_purchases(purchases: i32) -> Self {
        if purchases > 5 {
            Self::Hot
        } else if purchases > 0 {
            Self::Sold
        } else {
            Self::Fresh
        }
    }

    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Hot => "🔥",
            Self::Sold => "⭐",
            Self::Fresh => "🆕",
        }
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub project_type: ProjectType,
    pub level: ProjectLevel,
    pub programming_languages: Option<String>,
    pub technologies: Option<String>,
    pub price: Price,
}

/// Editable project fields, as offered in the admin edit menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectField {
    Title,
    Description,
    Price,
    DiscountPrice,
    Languages,
    Technologies,
    DemoUrl,
}

impl ProjectField {
    pub const ALL: &'static [Self] = &[
        Self::Title,
        Self::Description,
        Self::Price,
        Self::DiscountPrice,
        Self::Languages,
        Self::Technologies,
        Self::DemoUrl,
    ];

    /// Short token used in callback payloads.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "desc",
            Self::Price => "price",
            Self::DiscountPrice => "disc",
            Self::Languages => "langs",
            Self::Technologies => "tech",
            Self::DemoUrl => "demo",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.code() == code)
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::Price => "Price",
            Self::DiscountPrice => "Discount price",
            Self::Languages => "Languages",
            Self::Technologies => "Technologies",
            Self::DemoUrl => "Demo URL",
        }
    }

    /// Fields that can be cleared by sending `-`.
    #[must_use]
    pub const fn is_clearable(&self) -> bool {
        matches!(
            self,
            Self::DiscountPrice | Self::Languages | Self::Technologies | Self::DemoUrl
        )
    }
}

/// A single project field change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectUpdate {
    Title(String),
    Description(String),
    Price(Price),
    DiscountPrice(Option<Price>),
    Languages(Option<String>),
    Technologies(Option<String>),
    DemoUrl(Option<String>),
}

impl ProjectUpdate {
    #[must_use]
    pub const fn field(&self) -> ProjectField {
        match self {
            Self::Title(_) => ProjectField::Title,
            Self::Description(_) => ProjectField::Description,
            Self::Price(_) => ProjectField::Price,
            Self::DiscountPrice(_) => ProjectField::DiscountPrice,
            Self::Languages(_) => ProjectField::Languages,
            Self::Technologies(_) => ProjectField::Technologies,
            Self::DemoUrl(_) => ProjectField::DemoUrl,
        }
    }
}

/// Which projects a catalog listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CatalogFilter {
    #[default]
    All,
    Type(ProjectType),
    Category(CategoryId),
}

/// Average rating of a project.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
}

// =============================================================================
// Cart
// =============================================================================

/// A project sitting in a user's cart.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: CartItemId,
    pub project_id: ProjectId,
    pub title: String,
    pub price: Price,
    pub discount_price: Option<Price>,
    /// Inactive projects stay in the cart but cannot be bought.
    pub is_active: bool,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    #[must_use]
    pub fn effective_price(&self) -> Price {
        effective_price(self.price, self.discount_price)
    }
}

/// A user's cart.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines that can be checked out.
    pub fn available(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|line| line.is_active)
    }

    /// Sum of effective prices of the available lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.available().map(CartLine::effective_price).sum()
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// A star rating from one to five.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Filled and empty stars, e.g. `★★★☆☆`.
    #[must_use]
    pub fn stars(&self) -> String {
        let filled = usize::from(self.0);
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

/// A user's review of a purchased project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub project_id: Option<ProjectId>,
    pub rating: Rating,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or replacing a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub rating: Rating,
    pub comment: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;

    fn price(amount: &str) -> Price {
        Price::from_amount(Decimal::from_str(amount).unwrap())
    }

    fn line(id: i32, full: &str, discount: Option<&str>, is_active: bool) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            project_id: ProjectId::new(id),
            title: format!("Project {id}"),
            price: price(full),
            discount_price: discount.map(price),
            is_active,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_prefers_positive_discount() {
        assert_eq!(effective_price(price("8000"), Some(price("6500"))), price("6500"));
        assert_eq!(effective_price(price("8000"), None), price("8000"));
        assert_eq!(effective_price(price("8000"), Some(price("0"))), price("8000"));
        assert_eq!(effective_price(price("8000"), Some(price("9000"))), price("8000"));
    }

    #[test]
    fn test_cart_total_sums_effective_prices() {
        let cart = Cart {
            lines: vec![
                line(1, "8000", Some("6000"), true),
                line(2, "12000", None, true),
                line(3, "5000", Some("4500"), true),
            ],
        };
        assert_eq!(cart.total(), price("22500"));
    }

    #[test]
    fn test_cart_total_skips_inactive_lines() {
        let cart = Cart {
            lines: vec![line(1, "8000", None, true), line(2, "12000", None, false)],
        };
        assert_eq!(cart.total(), price("8000"));
        assert_eq!(cart.available().count(), 1);
        assert!(Cart::default().total().is_zero());
    }

    #[test]
    fn test_popularity_thresholds() {
        assert_eq!(Popularity::from_purchases(0), Popularity::Fresh);
        assert_eq!(Popularity::from_purchases(1), Popularity::Sold);
        assert_eq!(Popularity::from_purchases(5), Popularity::Sold);
        assert_eq!(Popularity::from_purchases(6), Popularity::Hot);
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_none());
        assert!(Rating::new(6).is_none());
        assert_eq!(Rating::new(4).unwrap().stars(), "★★★★☆");
    }

    #[test]
    fn test_project_field_codes_are_unique() {
        for field in ProjectField::ALL {
            assert_eq!(ProjectField::from_code(field.code()), Some(*field));
        }
    }
}
