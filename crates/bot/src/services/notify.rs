//! Best-effort notifications to chats other than the one being served.
//!
//! A failed notification never fails the action that caused it; it is
//! logged at `warn` and dropped.

use std::collections::BTreeSet;

use sqlx::PgPool;
use tracing::warn;

use crate::config::BotConfig;
use crate::db::{AdminRepository, RepositoryError};
use crate::telegram::{Keyboard, Messenger};

/// A message for another chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Notification {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: None,
        }
    }

    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    /// The same message for every chat in `chat_ids`.
    pub fn to_all(
        chat_ids: impl IntoIterator<Item = i64>,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Vec<Self> {
        chat_ids
            .into_iter()
            .map(|chat_id| Self {
                chat_id,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            })
            .collect()
    }
}

/// Send every notification, returning how many were delivered.
pub async fn deliver(messenger: &dyn Messenger, notifications: &[Notification]) -> usize {
    let mut delivered = 0;
    for notification in notifications {
        match messenger
            .send_text(
                notification.chat_id,
                &notification.text,
                notification.keyboard.as_ref(),
            )
            .await
        {
            Ok(_) => delivered += 1,
            Err(e) => warn!(chat_id = notification.chat_id, error = %e, "Notification not delivered"),
        }
    }
    delivered
}

/// Chats of everyone with admin access: the `admins` table plus `ADMIN_IDS`.
///
/// # Errors
///
/// Returns error if the admin list cannot be loaded.
pub async fn admin_chat_ids(pool: &PgPool, config: &BotConfig) -> Result<Vec<i64>, RepositoryError> {
    let mut ids: BTreeSet<i64> = AdminRepository::new(pool)
        .telegram_ids()
        .await?
        .into_iter()
        .map(|id| id.as_i64())
        .collect();
    ids.extend(config.admin_ids.iter().map(|id| id.as_i64()));
    Ok(ids.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_all_copies_message() {
        let keyboard = Keyboard::new().button("Open", "ao:5");
        let all = Notification::to_all([10, 20], "🆕 New order #5", Some(&keyboard));
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].chat_id, 20);
        assert_eq!(all[1].keyboard.as_ref(), Some(&keyboard));
    }
}
