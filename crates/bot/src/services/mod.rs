//! Business logic services for the bot.
//!
//! # Services
//!
//! - `broadcast` - Sequential mass notifications with delivery counters
//! - `checkout` - Stub payment gateway and purchase recording
//! - `notify` - Best-effort messages to admins and customers
//! - `storage` - Uploaded deliverables on the local filesystem

pub mod broadcast;
pub mod checkout;
pub mod notify;
pub mod storage;

pub use broadcast::{run_broadcast, send_all};
pub use checkout::{CheckoutOutcome, PurchasedItem, StubGateway, buy_now, checkout_cart, pay_order};
pub use notify::{Notification, admin_chat_ids, deliver};
pub use storage::{FileStorage, StorageError, StoredFile};
