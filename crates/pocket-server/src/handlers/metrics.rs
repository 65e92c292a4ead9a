//! Counter read-out.

use axum::{extract::State, Json};

use crate::{metrics::MetricsSnapshot, state::AppState};

pub async fn handle_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.dispatcher.metrics().snapshot())
}
