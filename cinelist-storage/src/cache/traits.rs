//! Cache backend trait.
//!
//! Backends store opaque JSON values. Typed access lives in
//! [`TaggedCache`](super::TaggedCache).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cinelist_core::StorageResult;
use serde_json::Value;

use super::key::{CacheKey, CacheTag};
use super::watermark::{TagStamp, Watermark};

/// A stored value and when it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    pub value: Value,
    pub cached_at: DateTime<Utc>,
}

/// Cache backend trait for pluggable cache implementations.
///
/// # Atomicity
///
/// - `invalidate_tag` must remove every entry carrying the tag and bump the
///   tag's generation as one step. A reader must never observe some of the
///   tag's entries removed and others still present.
/// - `put` must compare every stamp against the current generation and store
///   the entry in the same step, so an invalidation cannot slip in between.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value from the cache. Counts a hit or a miss.
    async fn get(&self, key: &CacheKey) -> StorageResult<Option<CachedValue>>;

    /// Current generation of a tag.
    async fn watermark(&self, tag: &CacheTag) -> StorageResult<Watermark>;

    /// Store a value under the given tags.
    ///
    /// Returns `false` without storing anything if any tag's generation no
    /// longer matches its stamp.
    async fn put(
        &self,
        key: &CacheKey,
        stamps: &[TagStamp],
        value: Value,
        cached_at: DateTime<Utc>,
    ) -> StorageResult<bool>;

    /// Remove every entry carrying the tag. Returns the number removed.
    async fn invalidate_tag(&self, tag: &CacheTag) -> StorageResult<u64>;

    /// Get cache statistics.
    async fn stats(&self) -> StorageResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of tag invalidations performed.
    pub invalidations: u64,
    /// Number of puts refused because a tag moved during the fetch.
    pub stale_puts: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
