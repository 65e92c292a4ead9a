//! `/infer` query parameters.

use serde::Deserialize;

/// Query string of `GET /infer`.
#[derive(Debug, Deserialize)]
pub struct InferQuery {
    pub prompt: String,
    pub session_id: String,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f64>,
}
