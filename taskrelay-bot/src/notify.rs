/// Notification fan-out
///
/// Sends one message to many recipients, counting attempts and successes.
/// A failed recipient is logged and skipped; one unreachable chat never
/// aborts the rest of the batch. The initiating flow reports the final
/// delivered/attempted counts back to the admin.
use std::sync::Arc;

use sqlx::PgPool;

use taskrelay_shared::models::User;

use crate::transport::{ChatTransport, Keyboard};

/// Outcome of one fan-out batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    /// Recipients the batch tried to reach
    pub attempted: usize,

    /// Recipients that accepted the message
    pub delivered: usize,
}

impl DeliveryReport {
    pub fn all_delivered(&self) -> bool {
        self.delivered == self.attempted
    }
}

/// Fan-out sender over a shared transport
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn ChatTransport>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    /// Sends `text` to every chat id, continuing past failures
    pub async fn send_to_many(
        &self,
        chat_ids: &[i64],
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> DeliveryReport {
        let mut report = DeliveryReport {
            attempted: chat_ids.len(),
            delivered: 0,
        };

        for &chat_id in chat_ids {
            match self
                .transport
                .send_message(chat_id, text, keyboard.cloned())
                .await
            {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    tracing::warn!(chat_id, error = %err, "notification delivery failed");
                }
            }
        }

        report
    }

    /// Notifies every admin, best effort
    pub async fn notify_admins(
        &self,
        pool: &PgPool,
        text: &str,
    ) -> Result<DeliveryReport, sqlx::Error> {
        let admins = User::list_admins(pool).await?;
        let chat_ids: Vec<i64> = admins.iter().map(|a| a.chat_id).collect();
        Ok(self.send_to_many(&chat_ids, text, None).await)
    }

    /// Notifies the users behind the given user ids, best effort
    ///
    /// Ids without a matching user row are counted as attempted but not
    /// delivered.
    pub async fn notify_users(
        &self,
        pool: &PgPool,
        user_ids: &[i64],
        text: &str,
    ) -> Result<DeliveryReport, sqlx::Error> {
        let mut report = DeliveryReport {
            attempted: user_ids.len(),
            delivered: 0,
        };

        for &user_id in user_ids {
            let Some(user) = User::find_by_id(pool, user_id).await? else {
                tracing::warn!(user_id, "notification target no longer exists");
                continue;
            };
            match self.transport.send_message(user.chat_id, text, None).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    tracing::warn!(chat_id = user.chat_id, error = %err, "notification delivery failed");
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::transport::DeliveryError;

    /// Records every send and fails for chosen chat ids
    struct FlakyTransport {
        fail_for: HashSet<i64>,
        sent: Mutex<Vec<(i64, String)>>,
    }

    impl FlakyTransport {
        fn new(fail_for: impl IntoIterator<Item = i64>) -> Self {
            Self {
                fail_for: fail_for.into_iter().collect(),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for FlakyTransport {
        async fn send_message(
            &self,
            chat_id: i64,
            text: &str,
            _keyboard: Option<Keyboard>,
        ) -> Result<(), DeliveryError> {
            if self.fail_for.contains(&chat_id) {
                return Err(DeliveryError {
                    chat_id,
                    reason: "blocked".to_string(),
                });
            }
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fan_out_continues_past_failures() {
        let transport = Arc::new(FlakyTransport::new([20]));
        let notifier = Notifier::new(transport.clone());

        let report = notifier.send_to_many(&[10, 20, 30], "hello", None).await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert!(!report.all_delivered());

        // The failing recipient did not stop later ones
        let sent = transport.sent.lock().unwrap();
        let reached: Vec<i64> = sent.iter().map(|(id, _)| *id).collect();
        assert_eq!(reached, vec![10, 30]);
    }

    #[tokio::test]
    async fn test_fan_out_empty_batch() {
        let notifier = Notifier::new(Arc::new(FlakyTransport::new([])));
        let report = notifier.send_to_many(&[], "hello", None).await;
        assert_eq!(report.attempted, 0);
        assert!(report.all_delivered());
    }

    #[tokio::test]
    async fn test_fan_out_all_succeed() {
        let transport = Arc::new(FlakyTransport::new([]));
        let notifier = Notifier::new(transport.clone());
        let report = notifier.send_to_many(&[1, 2, 3], "ping", None).await;
        assert_eq!(report.delivered, 3);
        assert!(report.all_delivered());
    }
}
