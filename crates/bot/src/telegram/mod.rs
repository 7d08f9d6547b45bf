//! Telegram Bot API integration.
//!
//! This module provides:
//! - [`TelegramClient`] for long polling and sending messages
//! - [`Messenger`], the trait handlers send through
//! - [`Keyboard`] for building inline keyboards
//! - Update and message types for the parts of the Bot API the bot uses

mod client;
mod error;
mod keyboard;
mod messenger;
mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use keyboard::{Button, Keyboard};
pub use messenger::{Messenger, OutgoingDocument};
pub use types::{BotUser, CallbackQuery, Chat, Document, Message, MessageRef, Update, User};
