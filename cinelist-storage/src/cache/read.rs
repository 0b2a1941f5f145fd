//! Cache read results.

use chrono::{DateTime, Utc};

use super::watermark::Watermark;

/// Result of a cache read, recording where the value came from.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    /// When the value was stored in the cache (or fetched, on a miss).
    cached_at: DateTime<Utc>,
    /// Generation of the entry's tags at the time of the read.
    watermark: Watermark,
    was_cache_hit: bool,
}

impl<T> CacheRead<T> {
    /// Create a cache read from a cache hit.
    pub fn from_cache(value: T, cached_at: DateTime<Utc>, watermark: Watermark) -> Self {
        Self {
            value,
            cached_at,
            watermark,
            was_cache_hit: true,
        }
    }

    /// Create a cache read from a storage fetch (cache miss).
    pub fn from_storage(value: T, watermark: Watermark) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            watermark,
            was_cache_hit: false,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }

    /// Transform the value, keeping the read metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheRead<U> {
        CacheRead {
            value: f(self.value),
            cached_at: self.cached_at,
            watermark: self.watermark,
            was_cache_hit: self.was_cache_hit,
        }
    }
}
