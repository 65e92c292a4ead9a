//! Wire types for the HTTP API.

pub mod history;
pub mod infer;

pub use history::{FeedbackRequest, HistoryEntry, SessionListEntry, StatusResponse};
pub use infer::InferQuery;
