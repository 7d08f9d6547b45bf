//! Bot users and admins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studybot_core::{AdminId, AdminRole, Email, Phone, TelegramId, UserId};

/// A person who has talked to the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub telegram_id: TelegramId,
    /// Telegram `@username`, without the `@`.
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<Phone>,
    pub email: Option<Email>,
    /// Blocked users get a notice instead of menus and never receive broadcasts.
    pub is_blocked: bool,
    /// Code other users pass to `/start` to register as referred by this user.
    pub referral_code: String,
    pub referred_by: Option<UserId>,
    pub last_active_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name used when greeting or listing the user.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self
                .username
                .as_ref()
                .map_or_else(|| format!("User {}", self.telegram_id), |u| format!("@{u}")),
        }
    }

    /// `@username` if the user has one.
    #[must_use]
    pub fn handle(&self) -> Option<String> {
        self.username.as_ref().map(|u| format!("@{u}"))
    }
}

/// Data needed to register a user on first contact.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub telegram_id: TelegramId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub referred_by: Option<UserId>,
}

/// A profile field the user can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileUpdate {
    FirstName(String),
    Phone(Phone),
    Email(Email),
}

/// Someone with access to the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: AdminId,
    pub telegram_id: TelegramId,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}

/// Activity summary shown on `/start` and in the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserActivity {
    pub purchases: i64,
    pub orders: i64,
}
