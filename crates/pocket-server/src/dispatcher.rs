//! Request dispatch: cache lookup, engine streaming and completion handoff.
//!
//! ```text
//! Idle ──► KeyLookup ──► CacheHitEmit ─────────────► Completed
//!                   └──► EngineStreaming ──► Completed (cache insert + save)
//! ```
//!
//! On a hit the caller gets exactly one event carrying the whole cached text.
//! On a miss the prompt is queued for saving, then every engine fragment is
//! forwarded as soon as it arrives. Only after the last fragment has been
//! handed out is the assembled text cached and queued as the assistant
//! message, so the caller never waits on bookkeeping.
//!
//! A stream that is dropped early (client disconnect) or cancelled (shutdown)
//! stops at once and skips the completion step: partial answers are never
//! cached or saved. An engine error is yielded as the final item and likewise
//! skips completion.

use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use pocket_engine::{EngineError, GenerationEngine};
use pocket_store::Role;
use serde::{Deserialize, Serialize};

use crate::cache::ResponseCache;
use crate::metrics::Metrics;
use crate::params::{derive_key, normalize};
use crate::state::ServerConfig;
use crate::stream_slots::StreamSlots;
use crate::writer::PersistenceWriter;

/// One inference request, as accepted from the caller.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: i64,
    pub temperature: f64,
    pub session_id: String,
}

/// One unit pushed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub token: String,
    pub cached: bool,
}

impl StreamEvent {
    pub fn fragment(token: String) -> Self {
        Self {
            token,
            cached: false,
        }
    }

    pub fn replay(token: String) -> Self {
        Self {
            token,
            cached: true,
        }
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, EngineError>> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("all {0} stream slots are busy")]
    AtCapacity(usize),
}

/// Owns the cache and counters shared by every request.
pub struct Dispatcher {
    engine: Arc<dyn GenerationEngine>,
    cache: Arc<ResponseCache>,
    metrics: Arc<Metrics>,
    slots: Arc<StreamSlots>,
    writer: PersistenceWriter,
    persist_cache_hits: bool,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<dyn GenerationEngine>,
        writer: PersistenceWriter,
        config: &ServerConfig,
    ) -> Self {
        Self {
            engine,
            cache: Arc::new(ResponseCache::new()),
            metrics: Arc::new(Metrics::new()),
            slots: StreamSlots::new(config.max_concurrent_streams),
            writer,
            persist_cache_hits: config.persist_cache_hits,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn slots(&self) -> &Arc<StreamSlots> {
        &self.slots
    }

    pub fn writer(&self) -> &PersistenceWriter {
        &self.writer
    }

    /// Route a request to the cached answer or a fresh engine stream.
    pub fn dispatch(&self, request: GenerationRequest) -> Result<EventStream, DispatchError> {
        self.metrics.record_request();

        let params = normalize(request.max_tokens, request.temperature);
        let key = derive_key(&request.prompt, &params);

        if let Some(cached) = self.cache.lookup(&key) {
            self.metrics.record_hit();
            tracing::info!(%key, "cache hit");
            if self.persist_cache_hits {
                self.writer
                    .save(request.session_id.as_str(), Role::User, request.prompt);
                self.writer
                    .save(request.session_id, Role::Assistant, cached.as_str());
            }
            return Ok(stream::iter([Ok(StreamEvent::replay(cached))]).boxed());
        }

        self.metrics.record_miss();
        tracing::info!(%key, "cache miss");

        let slot = self
            .slots
            .try_acquire(&request.session_id)
            .ok_or(DispatchError::AtCapacity(self.slots.max_concurrent()))?;

        self.writer
            .save(request.session_id.as_str(), Role::User, request.prompt.as_str());

        let mut fragments = self.engine.generate(&request.prompt, params.max_tokens);
        let cache = self.cache.clone();
        let writer = self.writer.clone();
        let session_id = request.session_id;

        let events = async_stream::stream! {
            // Keep the slot alive for the lifetime of the stream.
            let slot = slot;
            let cancel = slot.cancellation_token();
            let stream_id = slot.stream_id();
            let mut full_response = String::new();

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(%stream_id, "stream cancelled");
                        return;
                    }
                    next = fragments.next() => next,
                };

                match next {
                    Some(Ok(fragment)) => {
                        full_response.push_str(&fragment);
                        yield Ok(StreamEvent::fragment(fragment));
                    }
                    Some(Err(err)) => {
                        tracing::error!(%stream_id, error = %err, "generation failed");
                        yield Err(err);
                        return;
                    }
                    None => break,
                }
            }

            // Release the engine before bookkeeping.
            drop(fragments);
            tracing::debug!(%stream_id, chars = full_response.len(), "generation complete");
            cache.insert(key, full_response.clone());
            writer.save(session_id, Role::Assistant, full_response);
        };

        Ok(Box::pin(events))
    }
}
