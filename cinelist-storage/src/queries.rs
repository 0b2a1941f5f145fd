//! Cached reads over the item store.
//!
//! `get_items` and `get_stats` are cached under separate keys that share the
//! single tag [`ITEMS_TAG`]. Every successful mutation calls [`ItemQueries::invalidate`],
//! dropping both entries at once.

use std::sync::Arc;

use cinelist_core::{Item, ItemSnapshot, Stats, StorageResult};

use crate::cache::{CacheBackend, CacheKey, CacheRead, CacheTag, InMemoryCacheBackend, TaggedCache};
use crate::items::ItemStore;

/// Tag shared by every cached item read.
pub const ITEMS_TAG: &str = "items-data";
/// Cache key of the item list.
pub const ITEMS_KEY: &str = "items";
/// Cache key of the item stats.
pub const STATS_KEY: &str = "stats";

/// Both halves of a snapshot with their cache metadata.
#[derive(Debug, Clone)]
pub struct SnapshotRead {
    pub items: CacheRead<Vec<Item>>,
    pub stats: CacheRead<Stats>,
}

impl SnapshotRead {
    pub fn into_snapshot(self) -> ItemSnapshot {
        ItemSnapshot::new(self.items.into_value(), self.stats.into_value())
    }
}

/// Cached read side of the item list.
pub struct ItemQueries<C: CacheBackend = InMemoryCacheBackend> {
    store: Arc<ItemStore>,
    cache: TaggedCache<C>,
    tag: CacheTag,
    items_key: CacheKey,
    stats_key: CacheKey,
}

impl ItemQueries<InMemoryCacheBackend> {
    /// Queries backed by a fresh in-process cache.
    pub fn in_memory(store: Arc<ItemStore>) -> Self {
        Self::new(store, TaggedCache::new(Arc::new(InMemoryCacheBackend::new())))
    }
}

impl<C: CacheBackend> ItemQueries<C> {
    pub fn new(store: Arc<ItemStore>, cache: TaggedCache<C>) -> Self {
        Self {
            store,
            cache,
            tag: CacheTag::from(ITEMS_TAG),
            items_key: CacheKey::from(ITEMS_KEY),
            stats_key: CacheKey::from(STATS_KEY),
        }
    }

    pub fn store(&self) -> &Arc<ItemStore> {
        &self.store
    }

    pub fn cache(&self) -> &TaggedCache<C> {
        &self.cache
    }

    pub async fn get_items(&self) -> StorageResult<CacheRead<Vec<Item>>> {
        self.cache
            .get_or_fetch::<Vec<Item>, _>(&self.items_key, std::slice::from_ref(&self.tag), self.store.as_ref())
            .await
    }

    pub async fn get_stats(&self) -> StorageResult<CacheRead<Stats>> {
        self.cache
            .get_or_fetch::<Stats, _>(&self.stats_key, std::slice::from_ref(&self.tag), self.store.as_ref())
            .await
    }

    /// Fetch the list and the stats concurrently.
    pub async fn snapshot(&self) -> StorageResult<SnapshotRead> {
        let (items, stats) = tokio::join!(self.get_items(), self.get_stats());
        Ok(SnapshotRead {
            items: items?,
            stats: stats?,
        })
    }

    /// Drop both cached reads. Returns the number of entries removed.
    pub async fn invalidate(&self) -> StorageResult<u64> {
        self.cache.invalidate_tag(&self.tag).await
    }
}

impl<C: CacheBackend> Clone for ItemQueries<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
            tag: self.tag.clone(),
            items_key: self.items_key.clone(),
            stats_key: self.stats_key.clone(),
        }
    }
}
