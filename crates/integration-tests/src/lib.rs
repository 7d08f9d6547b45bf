//! Integration tests for `StudyBot`.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database
//! task db:start
//!
//! # Run integration tests (each test gets a fresh database)
//! DATABASE_URL=postgres://... cargo test -p studybot-integration-tests
//! ```
//!
//! Updates are fed straight into the handler pipeline; outgoing messages are
//! captured by [`RecordingMessenger`] instead of reaching Telegram.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use sqlx::PgPool;

use studybot_bot::config::{BotConfig, TelegramConfig};
use studybot_bot::db::{CategoryRepository, ProjectRepository};
use studybot_bot::handlers::handle_update;
use studybot_bot::models::{Category, NewCategory, NewProject, Project};
use studybot_bot::state::AppState;
use studybot_bot::telegram::{Keyboard, MessageRef, Messenger, OutgoingDocument, TelegramError, Update};
use studybot_core::{Price, ProjectLevel, ProjectType, TelegramId};

/// Something the bot sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    Edit { chat_id: i64, text: String },
    Answer { text: Option<String>, alert: bool },
    Document { chat_id: i64, file_name: String },
}

/// Messenger that records everything instead of talking to Telegram.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    next_message_id: Mutex<i64>,
    unreachable: Mutex<HashSet<i64>>,
}

impl RecordingMessenger {
    /// Make sends to `chat_id` fail as if the user blocked the bot.
    pub fn block_chat(&self, chat_id: i64) {
        self.unreachable.lock().unwrap().insert(chat_id);
    }

    fn push(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }

    /// Everything recorded so far, oldest first.
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Drop the recording.
    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// Texts sent or edited into `chat_id`.
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { chat_id: c, text } | Sent::Edit { chat_id: c, text } if c == chat_id => {
                    Some(text)
                }
                _ => None,
            })
            .collect()
    }

    /// Callback answers, as `(text, alert)`.
    pub fn answers(&self) -> Vec<(Option<String>, bool)> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Answer { text, alert } => Some((text, alert)),
                _ => None,
            })
            .collect()
    }
}

impl Messenger for RecordingMessenger {
    fn send_text<'a>(
        &'a self,
        chat_id: i64,
        text: &'a str,
        _keyboard: Option<&'a Keyboard>,
    ) -> BoxFuture<'a, Result<MessageRef, TelegramError>> {
        if self.unreachable.lock().unwrap().contains(&chat_id) {
            return async {
                Err(TelegramError::Api {
                    code: 403,
                    description: "Forbidden: bot was blocked by the user".to_string(),
                })
            }
            .boxed();
        }
        self.push(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        let message_id = {
            let mut next = self.next_message_id.lock().unwrap();
            *next += 1;
            *next
        };
        async move {
            Ok(MessageRef {
                chat_id,
                message_id,
            })
        }
        .boxed()
    }

    fn edit_text<'a>(
        &'a self,
        message: MessageRef,
        text: &'a str,
        _keyboard: Option<&'a Keyboard>,
    ) -> BoxFuture<'a, Result<(), TelegramError>> {
        self.push(Sent::Edit {
            chat_id: message.chat_id,
            text: text.to_string(),
        });
        async { Ok(()) }.boxed()
    }

    fn answer_callback<'a>(
        &'a self,
        _callback_id: &'a str,
        text: Option<&'a str>,
        alert: bool,
    ) -> BoxFuture<'a, Result<(), TelegramError>> {
        self.push(Sent::Answer {
            text: text.map(str::to_string),
            alert,
        });
        async { Ok(()) }.boxed()
    }

    fn send_document(
        &self,
        chat_id: i64,
        document: OutgoingDocument,
    ) -> BoxFuture<'_, Result<(), TelegramError>> {
        self.push(Sent::Document {
            chat_id,
            file_name: document.file_name,
        });
        async { Ok(()) }.boxed()
    }

    fn download_document<'a>(
        &'a self,
        _file_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, TelegramError>> {
        async { Ok(b"%PDF-1.4 test".to_vec()) }.boxed()
    }
}

/// Configuration for tests: no delays, uploads in a throwaway directory.
pub fn test_config(admin_ids: &[i64]) -> BotConfig {
    BotConfig {
        database_url: SecretString::from("postgres://unused"),
        telegram: TelegramConfig {
            token: SecretString::from("123456:test-token"),
            api_url: url::Url::parse("http://localhost:8081").unwrap(),
            poll_timeout: Duration::from_secs(1),
        },
        admin_ids: admin_ids.iter().copied().map(TelegramId::new).collect::<HashSet<_>>(),
        uploads_dir: std::env::temp_dir().join(format!("studybot-test-{}", uuid::Uuid::new_v4())),
        broadcast_delay: Duration::ZERO,
        dialogue_ttl: Duration::from_secs(600),
        health_addr: None,
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A bot wired to a test database and a [`RecordingMessenger`].
pub struct TestBot {
    pub state: AppState,
    pub messenger: Arc<RecordingMessenger>,
    next_update_id: Mutex<i64>,
}

impl TestBot {
    /// Bot with the given ids listed in `ADMIN_IDS`.
    pub fn new(pool: PgPool, admin_ids: &[i64]) -> Self {
        let messenger = Arc::new(RecordingMessenger::default());
        let state = AppState::new(
            test_config(admin_ids),
            pool,
            messenger.clone(),
            Some("study_shop_bot".to_string()),
        );
        Self {
            state,
            messenger,
            next_update_id: Mutex::new(0),
        }
    }

    pub fn pool(&self) -> &PgPool {
        self.state.pool()
    }

    fn update_id(&self) -> i64 {
        let mut next = self.next_update_id.lock().unwrap();
        *next += 1;
        *next
    }

    /// `user_id` types `text` in their private chat.
    pub async fn text(&self, user_id: i64, text: &str) {
        let update = text_update(self.update_id(), user_id, text);
        handle_update(&self.state, update).await;
    }

    /// `user_id` presses a button carrying `data` under message 1.
    pub async fn press(&self, user_id: i64, data: &str) {
        let update = callback_update(self.update_id(), user_id, data);
        handle_update(&self.state, update).await;
    }
}

fn sender(user_id: i64) -> serde_json::Value {
    json!({
        "id": user_id,
        "is_bot": false,
        "first_name": format!("User{user_id}"),
        "username": format!("user{user_id}"),
    })
}

/// A private text message.
pub fn text_update(update_id: i64, user_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": sender(user_id),
            "chat": { "id": user_id, "type": "private" },
            "date": 1_700_000_000,
            "text": text,
        }
    }))
    .unwrap()
}

/// A button press on a bot message in a private chat.
pub fn callback_update(update_id: i64, user_id: i64, data: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb-{update_id}"),
            "from": sender(user_id),
            "message": {
                "message_id": 1,
                "chat": { "id": user_id, "type": "private" },
                "date": 1_700_000_000,
                "text": "menu",
            },
            "data": data,
        }
    }))
    .unwrap()
}

/// Insert a category.
pub async fn create_category(pool: &PgPool, name: &str) -> Category {
    CategoryRepository::new(pool)
        .create(&NewCategory {
            name: name.to_string(),
            description: None,
            icon: Some("🐍".to_string()),
        })
        .await
        .unwrap()
}

/// Insert an active project priced in whole tenge.
pub async fn create_project(pool: &PgPool, category: &Category, title: &str, price: i64) -> Project {
    ProjectRepository::new(pool)
        .create(&NewProject {
            title: title.to_string(),
            description: format!("{title} description"),
            category_id: category.id,
            project_type: ProjectType::Project,
            level: ProjectLevel::Basic,
            programming_languages: Some("Python".to_string()),
            technologies: None,
            price: Price::from_amount(Decimal::from(price)),
        })
        .await
        .unwrap()
}
