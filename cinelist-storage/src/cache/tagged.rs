//! Read-through cache with tag-based invalidation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use cinelist_core::{StorageError, StorageResult};
use serde::{de::DeserializeOwned, Serialize};

use super::key::{CacheKey, CacheTag};
use super::read::CacheRead;
use super::traits::{CacheBackend, CacheStats};
use super::watermark::{TagStamp, Watermark};

/// Fetches a value from the underlying storage on a cache miss.
///
/// A single storage type may implement this for several value types, one
/// per cached read.
#[async_trait]
pub trait StorageFetcher<T>: Send + Sync {
    async fn fetch(&self) -> StorageResult<T>;
}

/// Typed read-through cache over a [`CacheBackend`].
///
/// ```ignore
/// let cache = TaggedCache::new(Arc::new(InMemoryCacheBackend::new()));
/// let read = cache
///     .get_or_fetch::<Vec<Item>, _>(&"items".into(), &["items-data".into()], &store)
///     .await?;
/// ```
pub struct TaggedCache<C: CacheBackend> {
    backend: Arc<C>,
}

impl<C: CacheBackend> TaggedCache<C> {
    pub fn new(backend: Arc<C>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Return the cached value for `key`, or fetch it and store it under `tags`.
    ///
    /// Tag generations are recorded before the fetch. If any of them moves
    /// before the result is stored, the result is returned to this caller but
    /// not cached.
    pub async fn get_or_fetch<T, S>(
        &self,
        key: &CacheKey,
        tags: &[CacheTag],
        storage: &S,
    ) -> StorageResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        S: StorageFetcher<T> + ?Sized,
    {
        let stamps = self.stamps(tags).await?;
        let watermark = stamps
            .iter()
            .map(|s| s.watermark)
            .max()
            .unwrap_or_default();

        if let Some(cached) = self.backend.get(key).await? {
            match serde_json::from_value::<T>(cached.value) {
                Ok(value) => {
                    tracing::debug!(key = %key, "cache hit");
                    return Ok(CacheRead::from_cache(value, cached.cached_at, watermark));
                }
                Err(e) => {
                    // Undecodable entries are treated as misses and overwritten.
                    tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry");
                }
            }
        }

        tracing::debug!(key = %key, "cache miss");
        let value = storage.fetch().await?;
        let json = serde_json::to_value(&value).map_err(|e| StorageError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let stored = self.backend.put(key, &stamps, json, Utc::now()).await?;
        if !stored {
            tracing::debug!(key = %key, "tag invalidated during fetch, result not cached");
        }
        Ok(CacheRead::from_storage(value, watermark))
    }

    /// Invalidate every entry carrying `tag`.
    pub async fn invalidate_tag(&self, tag: &CacheTag) -> StorageResult<u64> {
        let removed = self.backend.invalidate_tag(tag).await?;
        tracing::debug!(tag = %tag, removed, "cache tag invalidated");
        Ok(removed)
    }

    pub async fn watermark(&self, tag: &CacheTag) -> StorageResult<Watermark> {
        self.backend.watermark(tag).await
    }

    pub async fn stats(&self) -> StorageResult<CacheStats> {
        self.backend.stats().await
    }

    async fn stamps(&self, tags: &[CacheTag]) -> StorageResult<Vec<TagStamp>> {
        let mut stamps = Vec::with_capacity(tags.len());
        for tag in tags {
            let watermark = self.backend.watermark(tag).await?;
            stamps.push(TagStamp::new(tag.clone(), watermark));
        }
        Ok(stamps)
    }
}

impl<C: CacheBackend> Clone for TaggedCache<C> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}
