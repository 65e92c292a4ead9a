//! Health check handler.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Handle health check requests. Includes stream slot utilization.
pub async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    let slots = state.dispatcher.slots();
    Json(json!({
        "status": "ok",
        "streams": {
            "active": slots.active_count(),
            "max_concurrent": slots.max_concurrent(),
            "available": slots.available(),
        },
        "cache_entries": state.dispatcher.cache().len(),
    }))
}
