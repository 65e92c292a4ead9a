//! Message feedback handler.

use axum::{
    extract::{Path, State},
    Json,
};
use pocket_store::{MessageId, Vote};

use crate::{
    error::ServerError,
    models::{FeedbackRequest, StatusResponse},
    state::AppState,
};

/// Handle `PUT /messages/{message_id}/feedback`.
///
/// The vote is validated before the store is touched.
pub async fn handle_feedback(
    State(state): State<AppState>,
    Path(message_id): Path<MessageId>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<StatusResponse>, ServerError> {
    let vote: Vote = req.vote.parse().map_err(ServerError::InvalidRequest)?;
    state.store.set_feedback(message_id, vote).await?;
    tracing::info!(message_id, %vote, "feedback recorded");
    Ok(Json(StatusResponse::ok()))
}
