//! # pocket-engine
//!
//! The "narrow waist" between the PocketLLM front-end and whatever actually
//! produces text. Defines the [`GenerationEngine`] trait and the
//! [`FragmentStream`] it hands back, so the dispatcher never depends on a
//! concrete backend.
//!
//! ## Design Notes
//!
//! ### Lazy, single-use streams
//! `generate` does no work up front. All generation happens while the returned
//! stream is polled, and each call yields a fresh, independent sequence that
//! cannot be restarted. Dropping the stream part-way through is the
//! cancellation mechanism: implementations must not leave background work
//! running once their stream is gone.
//!
//! ### Self-delimiting fragments
//! Fragments carry their own trailing separators, so concatenating them in
//! emission order reproduces the full response text exactly.

use std::pin::Pin;

use futures::Stream;

pub mod mock;

pub use mock::MockEngine;

pub type Result<T> = std::result::Result<T, EngineError>;

/// A lazily produced, finite sequence of text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'static>>;

/// Errors raised while producing fragments.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

/// The core engine trait.
///
/// Implementations take `&self` so a single engine can serve many concurrent
/// requests; any mutable state is the implementation's to synchronize.
pub trait GenerationEngine: Send + Sync {
    /// Start generating a reply to `prompt`, producing at most `max_tokens`
    /// fragments.
    fn generate(&self, prompt: &str, max_tokens: usize) -> FragmentStream;
}
