//! Mass notifications.
//!
//! A broadcast is recorded, sent to each recipient in turn with a short pause
//! between sends, and finished with its delivery counters. Sends are never
//! retried and a run cannot be cancelled once started.

use std::time::Duration;

use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};

use studybot_core::{BroadcastAudience, TelegramId};

use crate::db::RepositoryError;
use crate::db::broadcasts;
use crate::models::{Broadcast, BroadcastReport};
use crate::telegram::Messenger;

/// Send `text` to each recipient in order, counting deliveries.
pub async fn send_all(
    messenger: &dyn Messenger,
    recipients: &[TelegramId],
    text: &str,
    delay: Duration,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for (i, recipient) in recipients.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match messenger.send_text(recipient.as_i64(), text, None).await {
            Ok(_) => report.record(true),
            Err(e) if e.is_unreachable_chat() => {
                debug!(recipient = %recipient, error = %e, "Broadcast recipient unreachable");
                report.record(false);
            }
            Err(e) => {
                warn!(recipient = %recipient, error = %e, "Broadcast send failed");
                report.record(false);
            }
        }
    }

    report
}

/// Record a broadcast, send it to `audience`, and store the counters.
///
/// # Errors
///
/// Returns error if the broadcast cannot be recorded or finished. Individual
/// send failures are counted, not returned.
#[instrument(skip(pool, messenger, text), fields(audience = %audience))]
pub async fn run_broadcast(
    pool: &PgPool,
    messenger: &dyn Messenger,
    admin_telegram_id: TelegramId,
    text: &str,
    audience: BroadcastAudience,
    delay: Duration,
) -> Result<Broadcast, RepositoryError> {
    let recipients = broadcasts::recipients(pool, audience).await?;
    let broadcast = broadcasts::create_broadcast(pool, admin_telegram_id, text, audience).await?;

    info!(
        broadcast_id = %broadcast.id,
        recipients = recipients.len(),
        "Broadcast started"
    );

    let report = send_all(messenger, &recipients, text, delay).await;
    let finished = broadcasts::finish_broadcast(pool, broadcast.id, report).await?;

    info!(
        broadcast_id = %finished.id,
        successful = report.successful,
        failed = report.failed,
        "Broadcast finished"
    );
    Ok(finished)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::FutureExt;
    use futures::future::BoxFuture;

    use super::*;
    use crate::telegram::{Keyboard, MessageRef, OutgoingDocument, TelegramError};

    /// Delivers to every chat except the ones in `blocked`.
    struct FakeMessenger {
        blocked: Vec<i64>,
        sent: Mutex<Vec<i64>>,
    }

    impl Messenger for FakeMessenger {
        fn send_text<'a>(
            &'a self,
            chat_id: i64,
            _text: &'a str,
            _keyboard: Option<&'a Keyboard>,
        ) -> BoxFuture<'a, Result<MessageRef, TelegramError>> {
            async move {
                if self.blocked.contains(&chat_id) {
                    return Err(TelegramError::Api {
                        code: 403,
                        description: "Forbidden: bot was blocked by the user".to_string(),
                    });
                }
                if let Ok(mut sent) = self.sent.lock() {
                    sent.push(chat_id);
                }
                Ok(MessageRef {
                    chat_id,
                    message_id: 1,
                })
            }
            .boxed()
        }

        fn edit_text<'a>(
            &'a self,
            _message: MessageRef,
            _text: &'a str,
            _keyboard: Option<&'a Keyboard>,
        ) -> BoxFuture<'a, Result<(), TelegramError>> {
            async { Ok(()) }.boxed()
        }

        fn answer_callback<'a>(
            &'a self,
            _callback_id: &'a str,
            _text: Option<&'a str>,
            _alert: bool,
        ) -> BoxFuture<'a, Result<(), TelegramError>> {
            async { Ok(()) }.boxed()
        }

        fn send_document(
            &self,
            _chat_id: i64,
            _document: OutgoingDocument,
        ) -> BoxFuture<'_, Result<(), TelegramError>> {
            async { Ok(()) }.boxed()
        }

        fn download_document<'a>(
            &'a self,
            _file_id: &'a str,
        ) -> BoxFuture<'a, Result<Vec<u8>, TelegramError>> {
            async { Ok(Vec::new()) }.boxed()
        }
    }

    #[tokio::test]
    async fn test_send_all_counts_failures() {
        let messenger = FakeMessenger {
            blocked: vec![2, 4],
            sent: Mutex::new(Vec::new()),
        };
        let recipients: Vec<TelegramId> = (1..=5).map(TelegramId::new).collect();

        let report = send_all(&messenger, &recipients, "Sale!", Duration::ZERO).await;

        assert_eq!(
            report,
            BroadcastReport {
                total: 5,
                successful: 3,
                failed: 2
            }
        );
        assert_eq!(*messenger.sent.lock().unwrap_or_else(std::sync::PoisonError::into_inner), [1, 3, 5]);
    }

    #[tokio::test]
    async fn test_send_all_with_no_recipients() {
        let messenger = FakeMessenger {
            blocked: Vec::new(),
            sent: Mutex::new(Vec::new()),
        };
        let report = send_all(&messenger, &[], "Sale!", Duration::from_millis(50)).await;
        assert_eq!(report, BroadcastReport::default());
    }
}
