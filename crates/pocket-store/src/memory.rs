//! In-process [`MessageStore`] backed by a `tokio::sync::RwLock`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::types::{Message, MessageId, Role, SessionSummary, Vote};
use crate::{session_title, MessageStore};

/// Volatile store; everything is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: MessageId,
    /// Bumped on every write; breaks `updated_at` ties when listing.
    touch_seq: u64,
    sessions: HashMap<String, SessionEntry>,
    messages: Vec<Message>,
}

#[derive(Debug)]
struct SessionEntry {
    summary: SessionSummary,
    touched: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored messages across all sessions.
    pub async fn message_count(&self) -> usize {
        self.inner.read().await.messages.len()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn save_message(&self, session_id: &str, role: Role, content: &str) -> Result<Message> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        inner.touch_seq += 1;
        let touched = inner.touch_seq;

        inner
            .sessions
            .entry(session_id.to_string())
            .and_modify(|entry| {
                entry.summary.updated_at = now;
                entry.touched = touched;
            })
            .or_insert_with(|| {
                tracing::debug!(session_id, "creating session");
                SessionEntry {
                    summary: SessionSummary {
                        id: session_id.to_string(),
                        title: session_title(content),
                        created_at: now,
                        updated_at: now,
                    },
                    touched,
                }
            });

        inner.next_id += 1;
        let message = Message {
            id: inner.next_id,
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            created_at: now,
            feedback: None,
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn read_history(&self, session_id: &str) -> Result<Vec<Message>> {
        let inner = self.inner.read().await;
        let mut history: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        history.sort_by_key(|m| m.created_at);
        Ok(history)
    }

    async fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<&SessionEntry> = inner.sessions.values().collect();
        entries.sort_by(|a, b| {
            (b.summary.updated_at, b.touched).cmp(&(a.summary.updated_at, a.touched))
        });
        Ok(entries
            .into_iter()
            .take(limit)
            .map(|e| e.summary.clone())
            .collect())
    }

    async fn set_feedback(&self, message_id: MessageId, vote: Vote) -> Result<()> {
        let mut inner = self.inner.write().await;
        let message = inner
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or(StoreError::MessageNotFound(message_id))?;
        message.feedback = Some(vote);
        Ok(())
    }
}
