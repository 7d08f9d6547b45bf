//! Domain types for the study-materials shop.
//!
//! This module provides type-safe wrappers for ids, money, contact details
//! and the enumerated states stored in the database.

pub mod contact;
pub mod id;
pub mod price;
pub mod status;

pub use contact::{Email, EmailError, Phone, PhoneError};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use status::*;
