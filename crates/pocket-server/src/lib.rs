//! # pocket-server
//!
//! Streaming inference front-end. Normalizes generation parameters, answers
//! repeat requests from an in-process response cache, and otherwise streams
//! engine fragments to the caller over Server-Sent Events while assembling
//! the full reply for the cache and the conversation history.

pub mod cache;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod params;
pub mod server;
pub mod state;
pub mod stream_slots;
pub mod streaming;
pub mod writer;

pub use cache::ResponseCache;
pub use dispatcher::{DispatchError, Dispatcher, EventStream, GenerationRequest, StreamEvent};
pub use error::ServerError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use params::{derive_key, normalize, CacheKey, NormalizedParameters, MAX_TOKENS_CEILING};
pub use server::{create_router, run_server};
pub use state::{AppState, ServerConfig};
pub use stream_slots::{StreamSlot, StreamSlots};
pub use writer::PersistenceWriter;
