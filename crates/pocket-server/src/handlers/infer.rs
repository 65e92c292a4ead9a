//! Streaming inference handler.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use crate::{
    dispatcher::GenerationRequest, error::ServerError, models::InferQuery, state::AppState,
    streaming,
};

/// Handle `GET /infer`.
///
/// Cache hits answer with a single replayed event; misses stream one event
/// per engine fragment. Storage problems never reach the caller here.
pub async fn handle_infer(
    State(state): State<AppState>,
    Query(query): Query<InferQuery>,
) -> Result<Response, ServerError> {
    if query.prompt.is_empty() {
        return Err(ServerError::InvalidRequest(
            "prompt must not be empty".to_string(),
        ));
    }

    let request = GenerationRequest {
        prompt: query.prompt,
        max_tokens: query.max_tokens.unwrap_or(state.config.default_max_tokens),
        temperature: query.temperature.unwrap_or(state.config.default_temperature),
        session_id: query.session_id,
    };

    let events = state.dispatcher.dispatch(request)?;
    Ok(streaming::sse_response(events).into_response())
}
