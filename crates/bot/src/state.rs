//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BotConfig;
use crate::conversation::DialogueStore;
use crate::services::{FileStorage, StubGateway};
use crate::telegram::Messenger;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`; spawned tasks such as
/// broadcasts hold their own clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BotConfig,
    pool: PgPool,
    messenger: Arc<dyn Messenger>,
    storage: FileStorage,
    dialogues: DialogueStore,
    gateway: StubGateway,
    bot_username: Option<String>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Bot configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `messenger` - Outgoing side of the chat platform
    /// * `bot_username` - The bot's `@username`, used in referral links
    #[must_use]
    pub fn new(
        config: BotConfig,
        pool: PgPool,
        messenger: Arc<dyn Messenger>,
        bot_username: Option<String>,
    ) -> Self {
        let storage = FileStorage::new(config.uploads_dir.clone());
        let dialogues = DialogueStore::new(config.dialogue_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                messenger,
                storage,
                dialogues,
                gateway: StubGateway,
                bot_username,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BotConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn messenger(&self) -> &dyn Messenger {
        self.inner.messenger.as_ref()
    }

    #[must_use]
    pub fn storage(&self) -> &FileStorage {
        &self.inner.storage
    }

    #[must_use]
    pub fn dialogues(&self) -> &DialogueStore {
        &self.inner.dialogues
    }

    #[must_use]
    pub fn gateway(&self) -> &StubGateway {
        &self.inner.gateway
    }

    #[must_use]
    pub fn bot_username(&self) -> Option<&str> {
        self.inner.bot_username.as_deref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("storage", &self.inner.storage)
            .field("bot_username", &self.inner.bot_username)
            .finish_non_exhaustive()
    }
}
