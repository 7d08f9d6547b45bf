//! Status and classification enums.
//!
//! Every enum here maps to a `PostgreSQL` enum type of the same snake_case
//! name (with the `postgres` feature), round-trips through its snake_case
//! string form via `Display`/`FromStr`, and carries the emoji and label
//! used when rendering it in chat.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known enum variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `Display`, `FromStr` and `ALL` for a fieldless enum with an
/// `as_str` method.
macro_rules! string_enum {
    ($name:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

// =============================================================================
// Custom order status
// =============================================================================

/// Lifecycle of a custom order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    UnderReview,
    Accepted,
    InProgress,
    ReadyForCheck,
    Completed,
    Rejected,
}

impl OrderStatus {
    /// Database and payload representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::UnderReview => "under_review",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::ReadyForCheck => "ready_for_check",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::New => "🆕",
            Self::UnderReview => "👀",
            Self::Accepted => "✅",
            Self::InProgress => "⚙️",
            Self::ReadyForCheck => "🔍",
            Self::Completed => "🎉",
            Self::Rejected => "❌",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::UnderReview => "Under review",
            Self::Accepted => "Accepted",
            Self::InProgress => "In progress",
            Self::ReadyForCheck => "Ready for check",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
        }
    }

    /// Statuses an admin may move an order to from this one.
    #[must_use]
    pub const fn next_statuses(&self) -> &'static [Self] {
        match self {
            Self::New => &[Self::UnderReview, Self::Accepted, Self::Rejected],
            Self::UnderReview => &[Self::Accepted, Self::Rejected],
            Self::Accepted => &[Self::InProgress, Self::Rejected],
            Self::InProgress => &[Self::ReadyForCheck],
            Self::ReadyForCheck => &[Self::Completed, Self::InProgress],
            Self::Completed | Self::Rejected => &[],
        }
    }

    /// Returns true if an admin may move an order from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Returns true once no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Returns true while the customer is still waiting on the work.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

string_enum!(
    OrderStatus,
    "order status",
    [
        New,
        UnderReview,
        Accepted,
        InProgress,
        ReadyForCheck,
        Completed,
        Rejected
    ]
);

// =============================================================================
// Catalog classification
// =============================================================================

/// Kind of deliverable, shared by catalog projects and custom orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "project_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Diploma,
    Coursework,
    Presentation,
    Project,
}

impl ProjectType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Diploma => "diploma",
            Self::Coursework => "coursework",
            Self::Presentation => "presentation",
            Self::Project => "project",
        }
    }

    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Diploma => "🎓",
            Self::Coursework => "📚",
            Self::Presentation => "📊",
            Self::Project => "💻",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Diploma => "Diploma",
            Self::Coursework => "Coursework",
            Self::Presentation => "Presentation",
            Self::Project => "Project",
        }
    }

    /// Plural label used for catalog sections.
    #[must_use]
    pub const fn plural_label(&self) -> &'static str {
        match self {
            Self::Diploma => "Diplomas",
            Self::Coursework => "Courseworks",
            Self::Presentation => "Presentations",
            Self::Project => "Projects",
        }
    }
}

string_enum!(
    ProjectType,
    "project type",
    [Diploma, Coursework, Presentation, Project]
);

/// Difficulty of a catalog project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "project_level", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectLevel {
    #[default]
    Basic,
    Intermediate,
    Advanced,
}

impl ProjectLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Basic => "🟢",
            Self::Intermediate => "🟡",
            Self::Advanced => "🔴",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

string_enum!(
    ProjectLevel,
    "project level",
    [Basic, Intermediate, Advanced]
);

// =============================================================================
// Support
// =============================================================================

/// Support ticket state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "ticket_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }

    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Open => "🟢",
            Self::InProgress => "🟡",
            Self::Closed => "⚫",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "Answered",
            Self::Closed => "Closed",
        }
    }
}

string_enum!(TicketStatus, "ticket status", [Open, InProgress, Closed]);

// =============================================================================
// Administration
// =============================================================================

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access to every admin section.
    #[default]
    Admin,
    /// Orders, tickets, users and broadcasts.
    Manager,
    /// Catalog and categories.
    ContentManager,
}

impl AdminRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::ContentManager => "content_manager",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Manager => "Manager",
            Self::ContentManager => "Content manager",
        }
    }

    /// Returns true if this role may open the given admin section.
    #[must_use]
    pub const fn can(&self, section: AdminSection) -> bool {
        match self {
            Self::Admin => true,
            Self::Manager => matches!(
                section,
                AdminSection::Stats
                    | AdminSection::Orders
                    | AdminSection::Tickets
                    | AdminSection::Users
                    | AdminSection::Broadcasts
            ),
            Self::ContentManager => matches!(
                section,
                AdminSection::Stats | AdminSection::Catalog | AdminSection::Categories
            ),
        }
    }
}

string_enum!(AdminRole, "admin role", [Admin, Manager, ContentManager]);

/// Areas of the admin panel, used for permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminSection {
    Stats,
    Catalog,
    Categories,
    Orders,
    Broadcasts,
    Users,
    Tickets,
}

/// Recipient filter for a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "broadcast_audience", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastAudience {
    /// Every user who is not blocked.
    #[default]
    All,
    /// Users who interacted within the last 30 days.
    Active,
    /// Users with at least one purchase.
    Buyers,
    /// Users without purchases.
    NonBuyers,
}

impl BroadcastAudience {
    /// Days without interaction after which a user stops counting as active.
    pub const ACTIVE_WINDOW_DAYS: i32 = 30;

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Buyers => "buyers",
            Self::NonBuyers => "non_buyers",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::All => "All users",
            Self::Active => "Active users",
            Self::Buyers => "Buyers",
            Self::NonBuyers => "Non-buyers",
        }
    }

    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::All => "👥",
            Self::Active => "🔥",
            Self::Buyers => "💰",
            Self::NonBuyers => "🆕",
        }
    }
}

string_enum!(
    BroadcastAudience,
    "broadcast audience",
    [All, Active, Buyers, NonBuyers]
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parse() {
        assert_eq!(
            "ready_for_check".parse::<OrderStatus>().unwrap(),
            OrderStatus::ReadyForCheck
        );
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: shipped");
    }

    #[test]
    fn test_order_status_happy_path_transitions() {
        let path = [
            OrderStatus::New,
            OrderStatus::Accepted,
            OrderStatus::InProgress,
            OrderStatus::ReadyForCheck,
            OrderStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{pair:?}");
        }
    }

    #[test]
    fn test_order_status_rejects_skips_and_reopening() {
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::InProgress.can_transition_to(OrderStatus::Rejected));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::InProgress));
        assert!(OrderStatus::Rejected.next_statuses().is_empty());
        assert!(OrderStatus::ReadyForCheck.can_transition_to(OrderStatus::InProgress));
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = OrderStatus::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, [&OrderStatus::Completed, &OrderStatus::Rejected]);
    }

    #[test]
    fn test_admin_role_permissions() {
        assert!(AdminRole::Admin.can(AdminSection::Broadcasts));
        assert!(AdminRole::Manager.can(AdminSection::Orders));
        assert!(!AdminRole::Manager.can(AdminSection::Catalog));
        assert!(AdminRole::ContentManager.can(AdminSection::Categories));
        assert!(!AdminRole::ContentManager.can(AdminSection::Users));
    }

    #[test]
    fn test_admin_role_from_str() {
        assert_eq!(
            "content_manager".parse::<AdminRole>().unwrap(),
            AdminRole::ContentManager
        );
        assert!("super_admin".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&BroadcastAudience::NonBuyers).unwrap();
        assert_eq!(json, "\"non_buyers\"");
        let parsed: ProjectType = serde_json::from_str("\"coursework\"").unwrap();
        assert_eq!(parsed, ProjectType::Coursework);
    }
}
