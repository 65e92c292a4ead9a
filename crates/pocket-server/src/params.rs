//! Parameter normalization and cache-key derivation.
//!
//! Both functions are pure and total: every input maps to an in-range value
//! and identical inputs always produce identical keys.

use std::fmt;

/// Upper bound on generated fragments per request.
pub const MAX_TOKENS_CEILING: usize = 200;

/// Separator between the fields of a [`CacheKey`].
pub const KEY_SEPARATOR: &str = "::";

/// Generation parameters after clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedParameters {
    /// In `[0, MAX_TOKENS_CEILING]`.
    pub max_tokens: usize,
    /// In `[0.0, 1.0]`.
    pub temperature: f64,
}

/// Clamp raw request parameters into their canonical ranges.
///
/// Negative token budgets floor to zero and a NaN temperature maps to `0.0`.
pub fn normalize(raw_max_tokens: i64, raw_temperature: f64) -> NormalizedParameters {
    let max_tokens = raw_max_tokens.clamp(0, MAX_TOKENS_CEILING as i64) as usize;
    let temperature = if raw_temperature.is_nan() {
        0.0
    } else {
        // Adding +0.0 folds -0.0 into 0.0 so both render the same key.
        raw_temperature.clamp(0.0, 1.0) + 0.0
    };
    NormalizedParameters {
        max_tokens,
        temperature,
    }
}

/// Identity of a repeatable request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the cache key for `prompt` under `params`.
///
/// Exact string composition, not a hash. A prompt that itself contains the
/// separator can collide with another triple; the service accepts that.
pub fn derive_key(prompt: &str, params: &NormalizedParameters) -> CacheKey {
    CacheKey(format!(
        "{prompt}{sep}{max}{sep}{temp}",
        sep = KEY_SEPARATOR,
        max = params.max_tokens,
        temp = params.temperature,
    ))
}
