//! Completed-response cache.
//!
//! Unbounded and process-local: entries live until the process exits. Values
//! are inserted whole under a write lock, so readers never see a partial entry.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::params::CacheKey;

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, String>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full response previously stored under `key`.
    pub fn lookup(&self, key: &CacheKey) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store `response` under `key`, replacing any previous value.
    pub fn insert(&self, key: CacheKey, response: String) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, response);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
