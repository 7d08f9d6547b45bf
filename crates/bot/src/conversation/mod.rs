//! Multi-step dialogues.
//!
//! A chat has at most one dialogue in progress. Wizards validate answers
//! and advance a step enum; handlers persist the result once a wizard is
//! complete. Dialogues live in memory and expire after a period of
//! inactivity, so a restart or a long pause simply drops the wizard.

pub mod admin;
pub mod input;
pub mod order;
pub mod review;
pub mod support;

use std::time::Duration;

use moka::future::Cache;

use studybot_core::{CategoryId, OrderId, ProjectId, TelegramId, TicketId};

pub use admin::{
    BroadcastWizard, CategoryField, CategoryStep, CategoryWizard, OrderNoteKind, ProjectStep,
    ProjectWizard, parse_project_field,
};
pub use input::{SKIP_MARKER, StepError};
pub use order::{OrderStep, OrderWizard};
pub use review::ReviewWizard;
pub use support::{ProfileField, TicketStep, TicketWizard};

use crate::models::ProjectField;

/// Chats tracked at once before the least recently used dialogue is evicted.
const MAX_DIALOGUES: u64 = 10_000;

/// The dialogue a chat is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialogue {
    // User flows
    CustomOrder(OrderWizard),
    SupportTicket(TicketWizard),
    EditProfile(ProfileField),
    Review(ReviewWizard),
    CatalogSearch,

    // Admin flows
    NewProject(ProjectWizard),
    EditProject {
        project_id: ProjectId,
        field: ProjectField,
    },
    ProjectFile {
        project_id: ProjectId,
    },
    NewCategory(CategoryWizard),
    EditCategory {
        category_id: CategoryId,
        field: CategoryField,
    },
    Broadcast(BroadcastWizard),
    OrderNote {
        order_id: OrderId,
        kind: OrderNoteKind,
    },
    OrderResult {
        order_id: OrderId,
    },
    TicketReply {
        ticket_id: TicketId,
    },
    UserSearch,
}

impl Dialogue {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CustomOrder(_) => "custom_order",
            Self::SupportTicket(_) => "support_ticket",
            Self::EditProfile(_) => "edit_profile",
            Self::Review(_) => "review",
            Self::CatalogSearch => "catalog_search",
            Self::NewProject(_) => "new_project",
            Self::EditProject { .. } => "edit_project",
            Self::ProjectFile { .. } => "project_file",
            Self::NewCategory(_) => "new_category",
            Self::EditCategory { .. } => "edit_category",
            Self::Broadcast(_) => "broadcast",
            Self::OrderNote { .. } => "order_note",
            Self::OrderResult { .. } => "order_result",
            Self::TicketReply { .. } => "ticket_reply",
            Self::UserSearch => "user_search",
        }
    }

    /// Returns true for dialogues that only admins may be in.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        !matches!(
            self,
            Self::CustomOrder(_)
                | Self::SupportTicket(_)
                | Self::EditProfile(_)
                | Self::Review(_)
                | Self::CatalogSearch
        )
    }
}

/// In-memory dialogue state keyed by chat.
#[derive(Clone)]
pub struct DialogueStore {
    cache: Cache<TelegramId, Dialogue>,
}

impl DialogueStore {
    /// Create a store whose entries expire after `ttl` without access.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_DIALOGUES)
                .time_to_idle(ttl)
                .build(),
        }
    }

    pub async fn get(&self, chat: TelegramId) -> Option<Dialogue> {
        self.cache.get(&chat).await
    }

    /// Start or replace the chat's dialogue.
    pub async fn set(&self, chat: TelegramId, dialogue: Dialogue) {
        tracing::debug!(chat_id = %chat, dialogue = dialogue.name(), "Dialogue set");
        self.cache.insert(chat, dialogue).await;
    }

    /// End the chat's dialogue, returning it if there was one.
    pub async fn clear(&self, chat: TelegramId) -> Option<Dialogue> {
        self.cache.remove(&chat).await
    }
}

impl std::fmt::Debug for DialogueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_set_get_clear() {
        let store = DialogueStore::new(Duration::from_secs(60));
        let chat = TelegramId::new(42);
        assert!(store.get(chat).await.is_none());

        store.set(chat, Dialogue::CatalogSearch).await;
        assert_eq!(store.get(chat).await, Some(Dialogue::CatalogSearch));

        store
            .set(chat, Dialogue::CustomOrder(OrderWizard::new()))
            .await;
        assert!(matches!(store.get(chat).await, Some(Dialogue::CustomOrder(_))));

        assert!(store.clear(chat).await.is_some());
        assert!(store.get(chat).await.is_none());
    }

    #[tokio::test]
    async fn test_store_keeps_chats_apart() {
        let store = DialogueStore::new(Duration::from_secs(60));
        store.set(TelegramId::new(1), Dialogue::UserSearch).await;
        assert!(store.get(TelegramId::new(2)).await.is_none());
    }

    #[test]
    fn test_admin_dialogues() {
        assert!(Dialogue::UserSearch.is_admin());
        assert!(Dialogue::Broadcast(BroadcastWizard::Message).is_admin());
        assert!(!Dialogue::CatalogSearch.is_admin());
        assert!(!Dialogue::EditProfile(ProfileField::Email).is_admin());
    }
}
