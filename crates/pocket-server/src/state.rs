//! Application state and configuration.

use std::sync::Arc;

use pocket_engine::GenerationEngine;
use pocket_store::MessageStore;

use crate::dispatcher::Dispatcher;
use crate::writer::PersistenceWriter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache, counters and engine streaming for `/infer`.
    pub dispatcher: Arc<Dispatcher>,
    /// Direct store access for the history and feedback endpoints.
    pub store: Arc<dyn MessageStore>,
    pub config: ServerConfig,
}

impl AppState {
    /// Wire up the dispatcher and start the persistence writer.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        engine: Arc<dyn GenerationEngine>,
        store: Arc<dyn MessageStore>,
        config: ServerConfig,
    ) -> Self {
        let writer = PersistenceWriter::spawn(store.clone());
        let dispatcher = Arc::new(Dispatcher::new(engine, writer, &config));
        Self {
            dispatcher,
            store,
            config,
        }
    }
}

/// Server configuration parameters.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Token budget used when a request omits `max_tokens`.
    pub default_max_tokens: i64,
    /// Temperature used when a request omits `temperature`.
    pub default_temperature: f64,
    /// Maximum engine streams running at once.
    pub max_concurrent_streams: usize,
    /// Also save prompt and replayed answer when serving from cache.
    pub persist_cache_hits: bool,
    /// Number of sessions returned by `GET /sessions`.
    pub session_list_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_max_tokens: 100,
            default_temperature: 0.7,
            max_concurrent_streams: 64,
            persist_cache_hits: false,
            session_list_limit: 50,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrent_streams(mut self, n: usize) -> Self {
        self.max_concurrent_streams = n;
        self
    }

    pub fn with_persist_cache_hits(mut self, enabled: bool) -> Self {
        self.persist_cache_hits = enabled;
        self
    }

    pub fn with_defaults(mut self, max_tokens: i64, temperature: f64) -> Self {
        self.default_max_tokens = max_tokens;
        self.default_temperature = temperature;
        self
    }
}
