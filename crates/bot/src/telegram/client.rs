//! Telegram Bot API client.
//!
//! Provides long polling, sending and editing HTML messages with inline
//! keyboards, answering callback queries, and uploading and downloading
//! documents.

use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::TelegramError;
use super::keyboard::Keyboard;
use super::types::{
    AnswerCallbackQuery, ApiResponse, BotUser, EditMessageText, File, GetUpdates,
    LinkPreviewOptions, Message, MessageRef, SendMessage, Update,
};
use crate::config::TelegramConfig;

/// All outgoing text is HTML; see `views::escape`.
const PARSE_MODE: &str = "HTML";

/// Extra time on top of the long-poll timeout before the HTTP request gives up.
const REQUEST_GRACE: Duration = Duration::from_secs(10);

/// Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    token: SecretString,
    api_url: Url,
    poll_timeout: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url.as_str())
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

/// Strip the URL (which embeds the bot token) before the error is logged.
fn request_error(err: reqwest::Error) -> TelegramError {
    TelegramError::Request(err.without_url().to_string())
}

fn response_error(err: reqwest::Error) -> TelegramError {
    TelegramError::Response(err.without_url().to_string())
}

impl TelegramClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(config.poll_timeout + REQUEST_GRACE)
            .build()
            .map_err(request_error)?;

        Ok(Self {
            client,
            token: config.token.clone(),
            api_url: config.api_url.clone(),
            poll_timeout: config.poll_timeout,
        })
    }

    fn base(&self) -> &str {
        self.api_url.as_str().trim_end_matches('/')
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base(), self.token.expose_secret())
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{file_path}",
            self.base(),
            self.token.expose_secret()
        )
    }

    async fn parse<R: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<R, TelegramError> {
        let body: ApiResponse<R> = response.json().await.map_err(response_error)?;

        if !body.ok {
            let code = body.error_code.unwrap_or_default();
            let description = body
                .description
                .unwrap_or_else(|| "Unknown error".to_string());
            debug!(method, code, %description, "Telegram API error");
            return Err(TelegramError::Api { code, description });
        }

        body.result
            .ok_or_else(|| TelegramError::Response(format!("{method} returned no result")))
    }

    async fn call<P: Serialize + Sync, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, TelegramError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(request_error)?;

        Self::parse(method, response).await
    }

    /// Identify the bot; used as a startup connectivity check.
    ///
    /// # Errors
    ///
    /// Returns error if the token is rejected or the API is unreachable.
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> Result<BotUser, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for updates after `offset`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Telegram returns an error.
    #[instrument(skip(self))]
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdates {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: ["message", "callback_query"],
        };
        self.call("getUpdates", &params).await
    }

    /// Send an HTML message.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Telegram returns an error.
    #[instrument(skip(self, text, keyboard), fields(chat_id = %chat_id))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TelegramError> {
        let params = SendMessage {
            chat_id,
            text,
            parse_mode: PARSE_MODE,
            reply_markup: keyboard,
            link_preview_options: LinkPreviewOptions { is_disabled: true },
        };
        let message: Message = self.call("sendMessage", &params).await?;

        Ok(MessageRef {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    /// Replace the text and keyboard of a message the bot sent.
    ///
    /// An edit that changes nothing is treated as success.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Telegram returns an error.
    #[instrument(skip(self, text, keyboard), fields(chat_id = %chat_id, message_id = %message_id))]
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TelegramError> {
        let params = EditMessageText {
            chat_id,
            message_id,
            text,
            parse_mode: PARSE_MODE,
            reply_markup: keyboard,
            link_preview_options: LinkPreviewOptions { is_disabled: true },
        };

        match self.call::<_, serde_json::Value>("editMessageText", &params).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_message_not_modified() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Stop the loading indicator on a pressed button, optionally with a toast.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Telegram returns an error.
    #[instrument(skip(self, text))]
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TelegramError> {
        let params = AnswerCallbackQuery {
            callback_query_id,
            text,
            show_alert,
        };
        let _: bool = self.call("answerCallbackQuery", &params).await?;
        Ok(())
    }

    /// Upload a document.
    ///
    /// # Errors
    ///
    /// Returns error if the upload fails or Telegram returns an error.
    #[instrument(skip(self, bytes, caption), fields(chat_id = %chat_id, size = bytes.len()))]
    pub async fn upload_document(
        &self,
        chat_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<(), TelegramError> {
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name.to_string()));
        if let Some(caption) = caption {
            form = form
                .text("caption", caption.to_string())
                .text("parse_mode", PARSE_MODE);
        }

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;

        let _: Message = Self::parse("sendDocument", response).await?;
        debug!(file_name, "Document sent");
        Ok(())
    }

    /// Download a file a user sent, by `file_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the file is unknown, too large for the Bot API, or
    /// the download fails.
    #[instrument(skip(self))]
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TelegramError> {
        let file: File = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;

        let Some(path) = file.file_path else {
            warn!(file_id, "getFile returned no path");
            return Err(TelegramError::Response(
                "file is not available for download".to_string(),
            ));
        };

        let response = self
            .client
            .get(self.file_url(&path))
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(TelegramError::Api {
                code: i32::from(response.status().as_u16()),
                description: "file download failed".to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(response_error)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> TelegramClient {
        TelegramClient::new(&TelegramConfig {
            token: SecretString::from("7012345678:AAHk3vQ9zL0pXc2mR7tYw8bN4sD1fG6jK5e".to_string()),
            api_url: Url::parse("https://api.telegram.org").unwrap(),
            poll_timeout: Duration::from_secs(30),
        })
        .unwrap()
    }

    #[test]
    fn test_method_url() {
        assert_eq!(
            client().method_url("getMe"),
            "https://api.telegram.org/bot7012345678:AAHk3vQ9zL0pXc2mR7tYw8bN4sD1fG6jK5e/getMe"
        );
    }

    #[test]
    fn test_file_url() {
        assert_eq!(
            client().file_url("documents/file_3.pdf"),
            "https://api.telegram.org/file/bot7012345678:AAHk3vQ9zL0pXc2mR7tYw8bN4sD1fG6jK5e/documents/file_3.pdf"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("AAHk3vQ9"));
    }
}
