//! Domain models for the bot.
//!
//! Repositories in [`crate::db`] convert database rows into these types;
//! handlers and views only ever see the models.

pub mod admin;
pub mod catalog;
pub mod order;
pub mod support;
pub mod user;

pub use admin::{Broadcast, BroadcastReport, DashboardStats};
pub use catalog::{
    Cart, CartLine, CatalogFilter, Category, CategorySummary, CategoryUpdate, NewCategory,
    NewProject, NewReview, Popularity, Project, ProjectField, ProjectUpdate, Rating,
    RatingSummary, Review, effective_price,
};
pub use order::{NewOrder, NewPurchase, Order, OwnedProject, Purchase, StatusCount};
pub use support::{NewTicket, Ticket};
pub use user::{Admin, NewUser, ProfileUpdate, User, UserActivity};
