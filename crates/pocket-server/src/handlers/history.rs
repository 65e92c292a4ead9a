//! Conversation history and session list handlers.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::ServerError,
    models::{HistoryEntry, SessionListEntry},
    state::AppState,
};

/// Handle `GET /history/{session_id}`: messages oldest first.
pub async fn handle_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, ServerError> {
    let messages = state.store.read_history(&session_id).await?;
    Ok(Json(messages.into_iter().map(HistoryEntry::from).collect()))
}

/// Handle `GET /sessions`: most recently updated first.
pub async fn handle_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionListEntry>>, ServerError> {
    let sessions = state
        .store
        .list_sessions(state.config.session_list_limit)
        .await?;
    Ok(Json(
        sessions.into_iter().map(SessionListEntry::from).collect(),
    ))
}
