//! Storage error types.

use crate::types::MessageId;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("message {0} not found")]
    MessageNotFound(MessageId),
}
