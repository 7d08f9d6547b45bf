//! Unified error handling for the bot.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::storage::StorageError;
use crate::telegram::TelegramError;

/// Application-level error type for update handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Telegram Bot API call failed.
    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    /// Reading or writing an uploaded file failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The action is not allowed in the current state.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a [`AppError::NotFound`] naming the missing entity.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Shorthand for a [`AppError::BadRequest`].
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Returns true for failures the user did not cause.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(RepositoryError::NotFound | RepositoryError::Conflict(_))
            | Self::NotFound(_)
            | Self::Forbidden(_)
            | Self::BadRequest(_) => false,
            Self::Database(_) | Self::Telegram(_) | Self::Storage(_) | Self::Internal(_) => true,
        }
    }

    /// Text shown to the user in chat.
    ///
    /// Internal details are never exposed; server errors get a generic line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(what) => format!("❌ {what} not found."),
            Self::Forbidden(_) => "⛔ You don't have access to this section.".to_string(),
            Self::BadRequest(message) => format!("⚠️ {message}"),
            Self::Database(RepositoryError::NotFound) => "❌ Not found.".to_string(),
            Self::Database(RepositoryError::Conflict(message)) => format!("⚠️ {message}"),
            Self::Database(_) | Self::Telegram(_) | Self::Storage(_) | Self::Internal(_) => {
                "😔 Something went wrong. Please try again later.".to_string()
            }
        }
    }

    /// Log server errors to tracing and Sentry. Client errors are logged at debug.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Update handling error"
            );
        } else {
            tracing::debug!(error = %self, "Update rejected");
        }
    }
}

/// Set the Sentry user context for the chat being handled.
pub fn set_sentry_user(telegram_id: i64, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(telegram_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::not_found("Project #12");
        assert_eq!(err.to_string(), "Not found: Project #12");

        let err = AppError::bad_request("cart is empty");
        assert_eq!(err.to_string(), "Bad request: cart is empty");
    }

    #[test]
    fn test_user_message_hides_internal_details() {
        let err = AppError::Internal("pool exhausted at 10.0.0.3".to_string());
        assert!(err.is_server_error());
        assert!(!err.user_message().contains("10.0.0.3"));

        let err = AppError::Database(RepositoryError::DataCorruption("bad row".to_string()));
        assert!(!err.user_message().contains("bad row"));
    }

    #[test]
    fn test_user_message_shows_client_errors() {
        assert_eq!(
            AppError::not_found("Order #5").user_message(),
            "❌ Order #5 not found."
        );
        assert_eq!(
            AppError::bad_request("You already own this project.").user_message(),
            "⚠️ You already own this project."
        );
        let conflict = AppError::Database(RepositoryError::Conflict(
            "Category still has projects.".to_string(),
        ));
        assert_eq!(conflict.user_message(), "⚠️ Category still has projects.");
        assert!(!AppError::Forbidden("orders".to_string()).is_server_error());
    }
}
