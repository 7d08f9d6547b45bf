//! Long-polling loop.
//!
//! Each `getUpdates` batch is split by chat. Chats are served concurrently
//! while the updates of a single chat run one after another in the order
//! Telegram delivered them, so a user's dialogue never sees its answers
//! out of order.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::handlers::handle_update;
use crate::state::AppState;
use crate::telegram::{TelegramClient, TelegramError, Update};

/// First pause after a failed poll.
const MIN_BACKOFF: Duration = Duration::from_secs(1);
/// Longest pause between failed polls.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Updates grouped by chat, each group in delivery order. Updates without a
/// chat are dropped.
#[must_use]
pub fn group_by_chat(updates: Vec<Update>) -> BTreeMap<i64, Vec<Update>> {
    let mut chats: BTreeMap<i64, Vec<Update>> = BTreeMap::new();
    for update in updates {
        match update.chat_id() {
            Some(chat_id) => chats.entry(chat_id).or_default().push(update),
            None => debug!(update_id = update.update_id, "Update without chat skipped"),
        }
    }
    chats
}

/// Offset that acknowledges every update in the batch.
#[must_use]
pub fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map_or(current, |next| next.max(current))
}

/// Handle one batch of updates.
pub async fn process_batch(state: &AppState, updates: Vec<Update>) {
    let chats = group_by_chat(updates);
    join_all(chats.into_values().map(|updates| async move {
        for update in updates {
            handle_update(state, update).await;
        }
    }))
    .await;
}

/// Poll Telegram and handle updates until `shutdown` resolves. The batch in
/// progress is finished before returning.
pub async fn run(state: AppState, client: TelegramClient, shutdown: impl Future<Output = ()>) {
    tokio::pin!(shutdown);
    let mut offset = 0;
    let mut backoff = MIN_BACKOFF;

    info!("Polling for updates");
    loop {
        let updates = tokio::select! {
            () = &mut shutdown => break,
            result = client.get_updates(offset) => result,
        };

        match updates {
            Ok(updates) => {
                backoff = MIN_BACKOFF;
                if updates.is_empty() {
                    continue;
                }
                offset = next_offset(offset, &updates);
                debug!(count = updates.len(), offset, "Updates received");
                process_batch(&state, updates).await;
            }
            Err(e) => {
                if matches!(e, TelegramError::Request(_)) {
                    warn!(error = %e, retry_in = ?backoff, "Polling request failed");
                } else {
                    error!(error = %e, retry_in = ?backoff, "Polling failed");
                }
                tokio::select! {
                    () = &mut shutdown => break,
                    () = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
    info!("Polling stopped");
}

/// Wait for Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn update(update_id: i64, chat_id: i64) -> Update {
        serde_json::from_value(serde_json::json!({
            "update_id": update_id,
            "message": {
                "message_id": update_id,
                "from": {"id": chat_id, "is_bot": false, "first_name": "Aida"},
                "chat": {"id": chat_id, "type": "private"},
                "text": format!("message {update_id}")
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_group_by_chat_keeps_order() {
        let grouped = group_by_chat(vec![update(1, 10), update(2, 20), update(3, 10)]);
        assert_eq!(grouped.len(), 2);
        let ids: Vec<i64> = grouped[&10].iter().map(|u| u.update_id).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn test_next_offset() {
        assert_eq!(next_offset(0, &[]), 0);
        assert_eq!(next_offset(5, &[update(7, 1), update(9, 1)]), 10);
        assert_eq!(next_offset(20, &[update(7, 1)]), 20);
    }
}
