/// In-memory conversation sessions
///
/// One session per chat id, holding the current [`ConvState`] and any draft
/// accumulated across the steps of a flow. Sessions are created lazily on
/// flow entry and dropped on completion or `/cancel`; a chat without a
/// session is `Idle`.
///
/// State is deliberately not persisted. A restart abandons half-finished
/// flows, which resume cleanly from the menu.
use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::state::ConvState;

/// Partially collected project fields
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Partially collected task fields
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub project_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_ref: Option<String>,

    /// Targets already resolved to user ids at the targets step
    pub target_user_ids: Option<Vec<i64>>,
}

/// Recipient scope chosen before the broadcast text is collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastScope {
    All,
    Project(i64),
    User(i64),
}

/// One chat's conversation session
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: ConvState,
    pub project: ProjectDraft,
    pub task: TaskDraft,
    pub broadcast_scope: Option<BroadcastScope>,
}

/// Concurrent session map keyed by chat id
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a chat, `Idle` when no session exists
    pub async fn state(&self, chat_id: i64) -> ConvState {
        self.inner
            .lock()
            .await
            .get(&chat_id)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    /// Clones the chat's session, defaulting when absent
    pub async fn snapshot(&self, chat_id: i64) -> Session {
        self.inner
            .lock()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Mutates (creating if needed) the chat's session
    pub async fn update<F>(&self, chat_id: i64, f: F)
    where
        F: FnOnce(&mut Session),
    {
        let mut guard = self.inner.lock().await;
        f(guard.entry(chat_id).or_default());
    }

    /// Replaces the chat's session with a fresh one in the given state
    pub async fn enter(&self, chat_id: i64, state: ConvState) {
        let mut guard = self.inner.lock().await;
        guard.insert(
            chat_id,
            Session {
                state,
                ..Default::default()
            },
        );
    }

    /// Removes and returns the chat's session
    pub async fn take(&self, chat_id: i64) -> Option<Session> {
        self.inner.lock().await.remove(&chat_id)
    }

    /// Drops the chat's session, returning to `Idle`
    pub async fn clear(&self, chat_id: i64) {
        self.inner.lock().await.remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_chat_is_idle() {
        let store = SessionStore::new();
        assert_eq!(store.state(55).await, ConvState::Idle);
    }

    #[tokio::test]
    async fn test_enter_resets_drafts() {
        let store = SessionStore::new();
        store.update(1, |s| {
            s.state = ConvState::TaskTitle;
            s.task.title = Some("stale".to_string());
        })
        .await;

        store.enter(1, ConvState::ProjectName).await;
        let session = store.snapshot(1).await;
        assert_eq!(session.state, ConvState::ProjectName);
        assert!(session.task.title.is_none());
    }

    #[tokio::test]
    async fn test_draft_accumulates_across_steps() {
        let store = SessionStore::new();
        store.enter(2, ConvState::TaskTitle).await;
        store.update(2, |s| {
            s.task.title = Some("report".to_string());
            s.state = ConvState::TaskDescription;
        })
        .await;
        store.update(2, |s| {
            s.task.description = Some("two pages".to_string());
            s.state = ConvState::TaskMedia;
        })
        .await;

        let session = store.snapshot(2).await;
        assert_eq!(session.task.title.as_deref(), Some("report"));
        assert_eq!(session.task.description.as_deref(), Some("two pages"));
        assert_eq!(session.state, ConvState::TaskMedia);
    }

    #[tokio::test]
    async fn test_clear_returns_to_idle() {
        let store = SessionStore::new();
        store.enter(3, ConvState::AwaitAnswer(9)).await;
        store.clear(3).await;
        assert_eq!(store.state(3).await, ConvState::Idle);
        assert!(store.take(3).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_per_chat() {
        let store = SessionStore::new();
        store.enter(10, ConvState::ProjectName).await;
        store.enter(11, ConvState::BroadcastMessage).await;
        assert_eq!(store.state(10).await, ConvState::ProjectName);
        assert_eq!(store.state(11).await, ConvState::BroadcastMessage);
    }
}
