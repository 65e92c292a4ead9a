//! Server-Sent Events (SSE) rendering of dispatcher streams.
//!
//! - Each event is sent as `data: {"token": ..., "cached": ...}\n\n`
//! - An engine failure becomes a final `event: error` carrying `{"error": ...}`
//! - The response closes when the dispatcher stream ends; there is no sentinel

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde_json::json;

use crate::dispatcher::EventStream;

/// Wrap a dispatcher stream as an SSE response.
///
/// When the client disconnects, axum drops the returned stream and with it
/// the dispatcher stream, which stops generation.
pub fn sse_response(events: EventStream) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = events.map(|item| {
        let event = match item {
            Ok(event) => Event::default().data(
                json!({
                    "token": event.token,
                    "cached": event.cached,
                })
                .to_string(),
            ),
            Err(err) => Event::default()
                .event("error")
                .data(json!({ "error": err.to_string() }).to_string()),
        };
        Ok(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
