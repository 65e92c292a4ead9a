//! History, session list and feedback types.

use chrono::{DateTime, Utc};
use pocket_store::{Message, MessageId, Role, SessionSummary, Vote};
use serde::{Deserialize, Serialize};

/// One message in `GET /history/{session_id}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub feedback: Option<Vote>,
}

impl From<Message> for HistoryEntry {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: message.content,
            timestamp: message.created_at,
            feedback: message.feedback,
        }
    }
}

/// One sidebar entry in `GET /sessions`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListEntry {
    pub id: String,
    pub title: String,
    /// Last update time.
    pub date: DateTime<Utc>,
}

impl From<SessionSummary> for SessionListEntry {
    fn from(summary: SessionSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            date: summary.updated_at,
        }
    }
}

/// Body of `PUT /messages/{id}/feedback`. The vote is kept as a raw string so
/// unknown values get a descriptive 400 instead of a generic decode error.
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub vote: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
