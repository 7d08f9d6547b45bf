//! Inline button payloads.
//!
//! Every button carries a short `:`-separated token string. [`Callback`]
//! parses and prints them so handlers never match on raw strings. Telegram
//! limits `callback_data` to 64 bytes.

use std::fmt;
use std::str::FromStr;

use studybot_core::{
    BroadcastAudience, CategoryId, OrderId, OrderStatus, ProjectId, ProjectLevel, ProjectType,
    TicketId, UserId,
};

use crate::conversation::{CategoryField, ProfileField};
use crate::models::{CatalogFilter, ProjectField, Rating};

/// Largest payload Telegram accepts.
pub const MAX_CALLBACK_BYTES: usize = 64;

/// A button press, decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    /// Button that does nothing (page counters).
    Noop,
    Menu,
    Help,

    // Catalog
    Catalog,
    Categories,
    List { filter: CatalogFilter, page: u32 },
    Project(ProjectId),
    Search,
    AddToCart(ProjectId),
    /// Remove from the cart; `in_cart` tells which screen to show afterwards.
    RemoveFromCart { project_id: ProjectId, in_cart: bool },
    Cart,
    ClearCart,
    Checkout,
    BuyNow(ProjectId),
    Download(ProjectId),
    Rate(ProjectId),

    // Account
    MyOrders,
    Purchases,
    Orders,
    Order(OrderId),
    PayOrder(OrderId),
    OrderResult(OrderId),
    OrderTicket(OrderId),
    NewOrder,
    Profile,
    ProfileStats,
    EditProfile(ProfileField),
    Referral,

    // Support
    Support,
    Faq,
    NewTicket,
    Tickets,
    Ticket(TicketId),

    // Wizard answers
    PickType(ProjectType),
    PickLevel(ProjectLevel),
    PickCategory(CategoryId),
    PickAudience(BroadcastAudience),
    PickRating(Rating),
    Skip,
    Confirm,
    Cancel,

    Admin(AdminAction),
}

/// Admin panel buttons, all prefixed with `a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Home,
    Stats,

    Projects { page: u32 },
    Project(ProjectId),
    EditProject { project_id: ProjectId, field: ProjectField },
    ToggleProject(ProjectId),
    DeleteProject(ProjectId),
    ConfirmDeleteProject(ProjectId),
    AttachFile(ProjectId),
    NewProject,

    OrdersMenu,
    Orders { status: Option<OrderStatus>, page: u32 },
    Order(OrderId),
    SetStatus { order_id: OrderId, status: OrderStatus },
    SetPrice(OrderId),
    Comment(OrderId),
    UploadResult(OrderId),

    Broadcasts,
    NewBroadcast,
    BroadcastHistory,

    Categories,
    Category(CategoryId),
    NewCategory,
    EditCategory { category_id: CategoryId, field: CategoryField },
    DeleteCategory(CategoryId),
    ConfirmDeleteCategory(CategoryId),

    Users { blocked_only: bool, page: u32 },
    User(UserId),
    SetBlocked { user_id: UserId, blocked: bool },
    SearchUsers,

    Tickets,
    Ticket(TicketId),
    ReplyTicket(TicketId),
    CloseTicket(TicketId),
}

/// The payload did not match any known button.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown callback payload: {0}")]
pub struct UnknownCallback(pub String);

fn id<T: From<i32>>(token: &str) -> Option<T> {
    token.parse::<i32>().ok().map(T::from)
}

fn page(token: &str) -> Option<u32> {
    token.parse().ok()
}

fn parse_filter(tokens: &[&str]) -> Option<(CatalogFilter, u32)> {
    match tokens {
        ["all", p] => Some((CatalogFilter::All, page(p)?)),
        ["t", kind, p] => Some((CatalogFilter::Type(kind.parse().ok()?), page(p)?)),
        ["c", category, p] => Some((CatalogFilter::Category(id(category)?), page(p)?)),
        _ => None,
    }
}

impl FromStr for Callback {
    type Err = UnknownCallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split(':').collect();
        let parsed = match tokens.as_slice() {
            ["noop"] => Some(Self::Noop),
            ["menu"] => Some(Self::Menu),
            ["help"] => Some(Self::Help),

            ["cat"] => Some(Self::Catalog),
            ["cats"] => Some(Self::Categories),
            ["ls", rest @ ..] => parse_filter(rest).map(|(filter, page)| Self::List { filter, page }),
            ["p", project] => id(project).map(Self::Project),
            ["search"] => Some(Self::Search),
            ["ca", project] => id(project).map(Self::AddToCart),
            ["cr", project] => id(project).map(|project_id| Self::RemoveFromCart {
                project_id,
                in_cart: false,
            }),
            ["crc", project] => id(project).map(|project_id| Self::RemoveFromCart {
                project_id,
                in_cart: true,
            }),
            ["cart"] => Some(Self::Cart),
            ["cart_clear"] => Some(Self::ClearCart),
            ["checkout"] => Some(Self::Checkout),
            ["buy", project] => id(project).map(Self::BuyNow),
            ["dl", project] => id(project).map(Self::Download),
            ["rate", project] => id(project).map(Self::Rate),

            ["my"] => Some(Self::MyOrders),
            ["purchases"] => Some(Self::Purchases),
            ["orders"] => Some(Self::Orders),
            ["o", order] => id(order).map(Self::Order),
            ["pay", order] => id(order).map(Self::PayOrder),
            ["ores", order] => id(order).map(Self::OrderResult),
            ["ot", order] => id(order).map(Self::OrderTicket),
            ["new_order"] => Some(Self::NewOrder),
            ["profile"] => Some(Self::Profile),
            ["pstats"] => Some(Self::ProfileStats),
            ["pe", field] => ProfileField::from_code(field).map(Self::EditProfile),
            ["ref"] => Some(Self::Referral),

            ["support"] => Some(Self::Support),
            ["faq"] => Some(Self::Faq),
            ["new_ticket"] => Some(Self::NewTicket),
            ["tickets"] => Some(Self::Tickets),
            ["t", ticket] => id(ticket).map(Self::Ticket),

            ["wt", kind] => kind.parse().ok().map(Self::PickType),
            ["wl", level] => level.parse().ok().map(Self::PickLevel),
            ["wc", category] => id(category).map(Self::PickCategory),
            ["wa", audience] => audience.parse().ok().map(Self::PickAudience),
            ["wr", stars] => stars
                .parse::<u8>()
                .ok()
                .and_then(Rating::new)
                .map(Self::PickRating),
            ["skip"] => Some(Self::Skip),
            ["ok"] => Some(Self::Confirm),
            ["cancel"] => Some(Self::Cancel),

            ["a", rest @ ..] => AdminAction::parse(rest).map(Self::Admin),
            _ => None,
        };
        parsed.ok_or_else(|| UnknownCallback(s.to_string()))
    }
}

impl AdminAction {
    fn parse(tokens: &[&str]) -> Option<Self> {
        Some(match tokens {
            [] => Self::Home,
            ["stats"] => Self::Stats,

            ["pl", p] => Self::Projects { page: page(p)? },
            ["p", project] => Self::Project(id(project)?),
            ["pe", project, field] => Self::EditProject {
                project_id: id(project)?,
                field: ProjectField::from_code(field)?,
            },
            ["pt", project] => Self::ToggleProject(id(project)?),
            ["pd", project] => Self::DeleteProject(id(project)?),
            ["pdy", project] => Self::ConfirmDeleteProject(id(project)?),
            ["pf", project] => Self::AttachFile(id(project)?),
            ["pn"] => Self::NewProject,

            ["om"] => Self::OrdersMenu,
            ["ol", "all", p] => Self::Orders {
                status: None,
                page: page(p)?,
            },
            ["ol", status, p] => Self::Orders {
                status: Some(status.parse().ok()?),
                page: page(p)?,
            },
            ["o", order] => Self::Order(id(order)?),
            ["os", order, status] => Self::SetStatus {
                order_id: id(order)?,
                status: status.parse().ok()?,
            },
            ["op", order] => Self::SetPrice(id(order)?),
            ["oc", order] => Self::Comment(id(order)?),
            ["or", order] => Self::UploadResult(id(order)?),

            ["b"] => Self::Broadcasts,
            ["bn"] => Self::NewBroadcast,
            ["bh"] => Self::BroadcastHistory,

            ["cl"] => Self::Categories,
            ["c", category] => Self::Category(id(category)?),
            ["cn"] => Self::NewCategory,
            ["ce", category, field] => Self::EditCategory {
                category_id: id(category)?,
                field: CategoryField::from_code(field)?,
            },
            ["cd", category] => Self::DeleteCategory(id(category)?),
            ["cdy", category] => Self::ConfirmDeleteCategory(id(category)?),

            ["ul", scope, p] => Self::Users {
                blocked_only: match *scope {
                    "all" => false,
                    "blocked" => true,
                    _ => return None,
                },
                page: page(p)?,
            },
            ["u", user] => Self::User(id(user)?),
            ["ub", user, flag] => Self::SetBlocked {
                user_id: id(user)?,
                blocked: match *flag {
                    "1" => true,
                    "0" => false,
                    _ => return None,
                },
            },
            ["us"] => Self::SearchUsers,

            ["tl"] => Self::Tickets,
            ["t", ticket] => Self::Ticket(id(ticket)?),
            ["tr", ticket] => Self::ReplyTicket(id(ticket)?),
            ["tc", ticket] => Self::CloseTicket(id(ticket)?),
            _ => return None,
        })
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noop => f.write_str("noop"),
            Self::Menu => f.write_str("menu"),
            Self::Help => f.write_str("help"),

            Self::Catalog => f.write_str("cat"),
            Self::Categories => f.write_str("cats"),
            Self::List { filter, page } => match filter {
                CatalogFilter::All => write!(f, "ls:all:{page}"),
                CatalogFilter::Type(kind) => write!(f, "ls:t:{kind}:{page}"),
                CatalogFilter::Category(category) => write!(f, "ls:c:{category}:{page}"),
            },
            Self::Project(project) => write!(f, "p:{project}"),
            Self::Search => f.write_str("search"),
            Self::AddToCart(project) => write!(f, "ca:{project}"),
            Self::RemoveFromCart {
                project_id,
                in_cart: false,
            } => write!(f, "cr:{project_id}"),
            Self::RemoveFromCart {
                project_id,
                in_cart: true,
            } => write!(f, "crc:{project_id}"),
            Self::Cart => f.write_str("cart"),
            Self::ClearCart => f.write_str("cart_clear"),
            Self::Checkout => f.write_str("checkout"),
            Self::BuyNow(project) => write!(f, "buy:{project}"),
            Self::Download(project) => write!(f, "dl:{project}"),
            Self::Rate(project) => write!(f, "rate:{project}"),

            Self::MyOrders => f.write_str("my"),
            Self::Purchases => f.write_str("purchases"),
            Self::Orders => f.write_str("orders"),
            Self::Order(order) => write!(f, "o:{order}"),
            Self::PayOrder(order) => write!(f, "pay:{order}"),
            Self::OrderResult(order) => write!(f, "ores:{order}"),
            Self::OrderTicket(order) => write!(f, "ot:{order}"),
            Self::NewOrder => f.write_str("new_order"),
            Self::Profile => f.write_str("profile"),
            Self::ProfileStats => f.write_str("pstats"),
            Self::EditProfile(field) => write!(f, "pe:{}", field.code()),
            Self::Referral => f.write_str("ref"),

            Self::Support => f.write_str("support"),
            Self::Faq => f.write_str("faq"),
            Self::NewTicket => f.write_str("new_ticket"),
            Self::Tickets => f.write_str("tickets"),
            Self::Ticket(ticket) => write!(f, "t:{ticket}"),

            Self::PickType(kind) => write!(f, "wt:{kind}"),
            Self::PickLevel(level) => write!(f, "wl:{level}"),
            Self::PickCategory(category) => write!(f, "wc:{category}"),
            Self::PickAudience(audience) => write!(f, "wa:{audience}"),
            Self::PickRating(rating) => write!(f, "wr:{}", rating.value()),
            Self::Skip => f.write_str("skip"),
            Self::Confirm => f.write_str("ok"),
            Self::Cancel => f.write_str("cancel"),

            Self::Admin(action) => fmt::Display::fmt(action, f),
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("a"),
            Self::Stats => f.write_str("a:stats"),

            Self::Projects { page } => write!(f, "a:pl:{page}"),
            Self::Project(project) => write!(f, "a:p:{project}"),
            Self::EditProject { project_id, field } => {
                write!(f, "a:pe:{project_id}:{}", field.code())
            }
            Self::ToggleProject(project) => write!(f, "a:pt:{project}"),
            Self::DeleteProject(project) => write!(f, "a:pd:{project}"),
            Self::ConfirmDeleteProject(project) => write!(f, "a:pdy:{project}"),
            Self::AttachFile(project) => write!(f, "a:pf:{project}"),
            Self::NewProject => f.write_str("a:pn"),

            Self::OrdersMenu => f.write_str("a:om"),
            Self::Orders { status: None, page } => write!(f, "a:ol:all:{page}"),
            Self::Orders {
                status: Some(status),
                page,
            } => write!(f, "a:ol:{status}:{page}"),
            Self::Order(order) => write!(f, "a:o:{order}"),
            Self::SetStatus { order_id, status } => write!(f, "a:os:{order_id}:{status}"),
            Self::SetPrice(order) => write!(f, "a:op:{order}"),
            Self::Comment(order) => write!(f, "a:oc:{order}"),
            Self::UploadResult(order) => write!(f, "a:or:{order}"),

            Self::Broadcasts => f.write_str("a:b"),
            Self::NewBroadcast => f.write_str("a:bn"),
            Self::BroadcastHistory => f.write_str("a:bh"),

            Self::Categories => f.write_str("a:cl"),
            Self::Category(category) => write!(f, "a:c:{category}"),
            Self::NewCategory => f.write_str("a:cn"),
            Self::EditCategory { category_id, field } => {
                write!(f, "a:ce:{category_id}:{}", field.code())
            }
            Self::DeleteCategory(category) => write!(f, "a:cd:{category}"),
            Self::ConfirmDeleteCategory(category) => write!(f, "a:cdy:{category}"),

            Self::Users { blocked_only, page } => {
                let scope = if *blocked_only { "blocked" } else { "all" };
                write!(f, "a:ul:{scope}:{page}")
            }
            Self::User(user) => write!(f, "a:u:{user}"),
            Self::SetBlocked { user_id, blocked } => {
                write!(f, "a:ub:{user_id}:{}", u8::from(*blocked))
            }
            Self::SearchUsers => f.write_str("a:us"),

            Self::Tickets => f.write_str("a:tl"),
            Self::Ticket(ticket) => write!(f, "a:t:{ticket}"),
            Self::ReplyTicket(ticket) => write!(f, "a:tr:{ticket}"),
            Self::CloseTicket(ticket) => write!(f, "a:tc:{ticket}"),
        }
    }
}

impl From<AdminAction> for Callback {
    fn from(action: AdminAction) -> Self {
        Self::Admin(action)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn round_trip(callback: Callback) {
        let encoded = callback.to_string();
        assert!(
            encoded.len() <= MAX_CALLBACK_BYTES,
            "{encoded} is {} bytes",
            encoded.len()
        );
        assert_eq!(encoded.parse::<Callback>().unwrap(), callback, "{encoded}");
    }

    #[test]
    fn test_catalog_payloads() {
        assert_eq!(
            "ls:t:diploma:2".parse::<Callback>().unwrap(),
            Callback::List {
                filter: CatalogFilter::Type(ProjectType::Diploma),
                page: 2
            }
        );
        assert_eq!(
            Callback::List {
                filter: CatalogFilter::Category(CategoryId::new(7)),
                page: 0
            }
            .to_string(),
            "ls:c:7:0"
        );
        assert_eq!("p:15".parse::<Callback>().unwrap(), Callback::Project(ProjectId::new(15)));
    }

    #[test]
    fn test_admin_payloads() {
        assert_eq!(
            "a:os:12:ready_for_check".parse::<Callback>().unwrap(),
            Callback::Admin(AdminAction::SetStatus {
                order_id: OrderId::new(12),
                status: OrderStatus::ReadyForCheck
            })
        );
        assert_eq!("a".parse::<Callback>().unwrap(), Callback::Admin(AdminAction::Home));
        assert_eq!(
            Callback::from(AdminAction::SetBlocked {
                user_id: UserId::new(3),
                blocked: true
            })
            .to_string(),
            "a:ub:3:1"
        );
    }

    #[test]
    fn test_unknown_payloads() {
        for raw in ["", "p", "p:abc", "ls:t:thesis:0", "a:os:1:shipped", "a:ub:1:2", "wr:6", "zzz"] {
            assert!(raw.parse::<Callback>().is_err(), "{raw}");
        }
    }

    #[test]
    fn test_longest_payloads_fit() {
        let big_id = i32::MAX;
        round_trip(Callback::List {
            filter: CatalogFilter::Type(ProjectType::Presentation),
            page: u32::MAX,
        });
        round_trip(Callback::Admin(AdminAction::SetStatus {
            order_id: OrderId::new(big_id),
            status: OrderStatus::ReadyForCheck,
        }));
        round_trip(Callback::Admin(AdminAction::EditProject {
            project_id: ProjectId::new(big_id),
            field: ProjectField::Technologies,
        }));
        round_trip(Callback::Admin(AdminAction::Orders {
            status: Some(OrderStatus::UnderReview),
            page: u32::MAX,
        }));
        round_trip(Callback::Admin(AdminAction::ConfirmDeleteCategory(
            CategoryId::new(big_id),
        )));
        round_trip(Callback::PickAudience(BroadcastAudience::NonBuyers));
        round_trip(Callback::EditProfile(ProfileField::Email));
        round_trip(Callback::RemoveFromCart {
            project_id: ProjectId::new(big_id),
            in_cart: true,
        });
    }
}
