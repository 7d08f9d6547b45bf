//! The outgoing side of the bot, as a trait.
//!
//! Handlers and services only talk to [`Messenger`], so tests can swap the
//! real [`TelegramClient`] for a recorder.

use futures::FutureExt;
use futures::future::BoxFuture;

use super::client::TelegramClient;
use super::error::TelegramError;
use super::keyboard::Keyboard;
use super::types::MessageRef;

/// A document to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub caption: Option<String>,
}

/// Operations the bot performs against the chat platform.
pub trait Messenger: Send + Sync {
    /// Send a new HTML message.
    fn send_text<'a>(
        &'a self,
        chat_id: i64,
        text: &'a str,
        keyboard: Option<&'a Keyboard>,
    ) -> BoxFuture<'a, Result<MessageRef, TelegramError>>;

    /// Replace the text and keyboard of an earlier message.
    fn edit_text<'a>(
        &'a self,
        message: MessageRef,
        text: &'a str,
        keyboard: Option<&'a Keyboard>,
    ) -> BoxFuture<'a, Result<(), TelegramError>>;

    /// Acknowledge a button press, optionally with a toast or alert.
    fn answer_callback<'a>(
        &'a self,
        callback_id: &'a str,
        text: Option<&'a str>,
        alert: bool,
    ) -> BoxFuture<'a, Result<(), TelegramError>>;

    /// Upload a document.
    fn send_document(
        &self,
        chat_id: i64,
        document: OutgoingDocument,
    ) -> BoxFuture<'_, Result<(), TelegramError>>;

    /// Fetch the contents of a file a user uploaded.
    fn download_document<'a>(
        &'a self,
        file_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, TelegramError>>;
}

impl Messenger for TelegramClient {
    fn send_text<'a>(
        &'a self,
        chat_id: i64,
        text: &'a str,
        keyboard: Option<&'a Keyboard>,
    ) -> BoxFuture<'a, Result<MessageRef, TelegramError>> {
        self.send_message(chat_id, text, keyboard).boxed()
    }

    fn edit_text<'a>(
        &'a self,
        message: MessageRef,
        text: &'a str,
        keyboard: Option<&'a Keyboard>,
    ) -> BoxFuture<'a, Result<(), TelegramError>> {
        self.edit_message_text(message.chat_id, message.message_id, text, keyboard)
            .boxed()
    }

    fn answer_callback<'a>(
        &'a self,
        callback_id: &'a str,
        text: Option<&'a str>,
        alert: bool,
    ) -> BoxFuture<'a, Result<(), TelegramError>> {
        self.answer_callback_query(callback_id, text, alert).boxed()
    }

    fn send_document(
        &self,
        chat_id: i64,
        document: OutgoingDocument,
    ) -> BoxFuture<'_, Result<(), TelegramError>> {
        async move {
            self.upload_document(
                chat_id,
                &document.file_name,
                document.bytes,
                document.caption.as_deref(),
            )
            .await
        }
        .boxed()
    }

    fn download_document<'a>(
        &'a self,
        file_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, TelegramError>> {
        self.download_file(file_id).boxed()
    }
}
