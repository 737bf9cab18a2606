/// Shared handler context
///
/// One `Context` is built at startup and shared by every dispatched event.
/// It owns the database pool, the outbound transport, the session store,
/// and the configured admin passphrase.
use std::sync::Arc;

use sqlx::PgPool;

use crate::error::BotResult;
use crate::notify::Notifier;
use crate::session::SessionStore;
use crate::transport::{ChatTransport, Keyboard};

pub struct Context {
    pub pool: PgPool,
    pub transport: Arc<dyn ChatTransport>,
    pub sessions: SessionStore,
    pub notifier: Notifier,
    pub admin_passphrase: String,
}

impl Context {
    pub fn new(pool: PgPool, transport: Arc<dyn ChatTransport>, admin_passphrase: String) -> Self {
        Self {
            pool,
            notifier: Notifier::new(transport.clone()),
            transport,
            sessions: SessionStore::new(),
            admin_passphrase,
        }
    }

    /// Sends a reply to the initiating chat
    pub async fn reply(
        &self,
        chat_id: i64,
        text: impl AsRef<str>,
        keyboard: Option<Keyboard>,
    ) -> BotResult<()> {
        self.transport
            .send_message(chat_id, text.as_ref(), keyboard)
            .await?;
        Ok(())
    }
}
