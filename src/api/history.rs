//! Per-session conversation history kept by the backend

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::conversation::{Message, Sender};

/// In-memory history keyed by session id
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    sessions: Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl SessionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a session, creating the session if needed
    pub async fn add_message(&self, session_id: &str, sender: Sender, text: &str) {
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .push(Message::new(sender, text));
    }

    /// Snapshot of a session's messages (empty if unknown)
    pub async fn conversation(&self, session_id: &str) -> Vec<Message> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget a session
    pub async fn clear(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// Number of sessions with history
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_isolated() {
        let history = SessionHistory::new();
        history.add_message("a", Sender::User, "hi").await;
        history.add_message("a", Sender::Ai, "hello").await;
        history.add_message("b", Sender::User, "bonjour").await;

        assert_eq!(history.conversation("a").await.len(), 2);
        assert_eq!(history.conversation("b").await.len(), 1);
        assert!(history.conversation("c").await.is_empty());
        assert_eq!(history.session_count().await, 2);
    }

    #[tokio::test]
    async fn clear_removes_session() {
        let history = SessionHistory::new();
        history.add_message("a", Sender::User, "hi").await;
        history.clear("a").await;
        history.clear("missing").await;

        assert!(history.conversation("a").await.is_empty());
        assert_eq!(history.session_count().await, 0);
    }
}
