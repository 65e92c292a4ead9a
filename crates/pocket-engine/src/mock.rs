//! Simulated CPU engine.
//!
//! Echoes the prompt inside a canned reply and streams it one word at a time
//! with a fixed delay per word, standing in for real decode latency.

use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::{EngineError, FragmentStream, GenerationEngine};

/// Per-fragment latency used when none is configured.
pub const DEFAULT_TOKEN_DELAY: Duration = Duration::from_millis(100);

/// Build the full reply the mock engine streams for `prompt`.
pub fn synthesize_reply(prompt: &str) -> String {
    format!(
        " [CPU-Mode] You said: '{prompt}'. This is a generated response streaming token by token to demonstrate the architecture."
    )
}

/// Engine that streams a synthesized reply word by word.
#[derive(Debug, Clone)]
pub struct MockEngine {
    token_delay: Duration,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Mock engine with the default 100ms per-fragment delay.
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_TOKEN_DELAY)
    }

    /// Mock engine sleeping `token_delay` before each fragment.
    pub fn with_delay(token_delay: Duration) -> Self {
        Self { token_delay }
    }

    /// Mock engine with no artificial latency (tests).
    pub fn instant() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn token_delay(&self) -> Duration {
        self.token_delay
    }
}

impl GenerationEngine for MockEngine {
    fn generate(&self, prompt: &str, max_tokens: usize) -> FragmentStream {
        let fragments: Vec<String> = synthesize_reply(prompt)
            .split(' ')
            .map(|word| format!("{word} "))
            .take(max_tokens)
            .collect();
        let delay = self.token_delay;
        tracing::debug!(fragments = fragments.len(), "mock generation started");

        stream::iter(fragments)
            .then(move |fragment| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, EngineError>(fragment)
            })
            .boxed()
    }
}
