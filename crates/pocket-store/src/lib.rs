//! # pocket-store
//!
//! Narrow persistence contract for conversation history. The inference
//! front-end only needs to append messages, read a session back, list recent
//! sessions and record thumbs-up/down feedback, so that is all [`MessageStore`]
//! exposes. [`MemoryStore`] is the in-process implementation.

pub mod error;
pub mod memory;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use types::{Message, MessageId, Role, SessionSummary, Vote};

use async_trait::async_trait;

/// Number of characters of the first message used as a session title.
pub const TITLE_CHARS: usize = 30;

/// Storage backend for sessions, messages and feedback.
///
/// All methods take `&self`; implementations must tolerate concurrent calls,
/// including concurrent saves into the same session.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message, creating the session on first use.
    async fn save_message(&self, session_id: &str, role: Role, content: &str) -> Result<Message>;

    /// All messages of a session, oldest first.
    async fn read_history(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Up to `limit` sessions, most recently updated first.
    async fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>>;

    /// Record a vote on an existing message.
    async fn set_feedback(&self, message_id: MessageId, vote: Vote) -> Result<()>;
}

/// Derive a session title from the first message of a conversation.
pub fn session_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
