//! StudyBot Core - Shared types library.
//!
//! This crate provides the domain types used across all StudyBot components:
//! - `bot` - The Telegram bot (catalog, cart, orders, support, admin panel)
//! - `cli` - Command-line tools for migrations, seeding and admin grants
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. The `postgres` feature adds `sqlx` encodings.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, contact details and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
