//! HTTP error handling and response mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pocket_store::StoreError;
use serde_json::json;

use crate::dispatcher::DispatchError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("server at capacity")]
    ServiceUnavailable,
}

impl From<DispatchError> for ServerError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::AtCapacity(_) => ServerError::ServiceUnavailable,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", msg)
            }
            ServerError::Store(err @ StoreError::MessageNotFound(_)) => {
                (StatusCode::NOT_FOUND, "not_found_error", err.to_string())
            }
            ServerError::Store(err) => {
                tracing::error!(error = %err, "storage request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "server_error", err.to_string())
            }
            ServerError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "server_error",
                "Server at capacity, try again later".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": error_type,
            }
        }));

        (status, body).into_response()
    }
}
