//! Telegram-related errors.

use thiserror::Error;

/// Errors that can occur when talking to the Telegram Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed.
    #[error("Telegram request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Telegram response error: {0}")]
    Response(String),

    /// The Bot API answered `ok: false`.
    #[error("Telegram API error {code}: {description}")]
    Api { code: i32, description: String },

    /// Reading a local file for upload failed.
    #[error("Telegram upload I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelegramError {
    /// Returns true if the recipient blocked the bot or never started it.
    ///
    /// Broadcasts count these as failures without logging them as errors.
    #[must_use]
    pub fn is_unreachable_chat(&self) -> bool {
        matches!(self, Self::Api { code: 403, .. })
            || matches!(self, Self::Api { code: 400, description } if description.contains("chat not found"))
    }

    /// Returns true if an edit was refused because nothing changed.
    #[must_use]
    pub fn is_message_not_modified(&self) -> bool {
        matches!(self, Self::Api { description, .. } if description.contains("message is not modified"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_chat() {
        let blocked = TelegramError::Api {
            code: 403,
            description: "Forbidden: bot was blocked by the user".to_string(),
        };
        assert!(blocked.is_unreachable_chat());

        let missing = TelegramError::Api {
            code: 400,
            description: "Bad Request: chat not found".to_string(),
        };
        assert!(missing.is_unreachable_chat());

        assert!(!TelegramError::Request("timeout".to_string()).is_unreachable_chat());
    }

    #[test]
    fn test_message_not_modified() {
        let err = TelegramError::Api {
            code: 400,
            description: "Bad Request: message is not modified: specified new message content \
                          and reply markup are exactly the same"
                .to_string(),
        };
        assert!(err.is_message_not_modified());
        assert!(!err.is_unreachable_chat());
    }
}
