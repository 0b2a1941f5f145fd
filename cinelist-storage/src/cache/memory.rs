//! In-process cache backend.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cinelist_core::{StorageError, StorageResult};
use serde_json::Value;

use super::key::{CacheKey, CacheTag};
use super::traits::{CacheBackend, CacheStats, CachedValue};
use super::watermark::{TagStamp, Watermark};

#[derive(Debug)]
struct Entry {
    value: Value,
    cached_at: DateTime<Utc>,
    tags: BTreeSet<CacheTag>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<CacheKey, Entry>,
    /// tag -> keys carrying it
    tag_index: HashMap<CacheTag, HashSet<CacheKey>>,
    generations: HashMap<CacheTag, Watermark>,
    stats: CacheStats,
}

impl State {
    fn generation(&self, tag: &CacheTag) -> Watermark {
        self.generations.get(tag).copied().unwrap_or_default()
    }

    fn remove_entry(&mut self, key: &CacheKey) {
        if let Some(old) = self.entries.remove(key) {
            for tag in old.tags {
                if let Some(keys) = self.tag_index.get_mut(&tag) {
                    keys.remove(key);
                    if keys.is_empty() {
                        self.tag_index.remove(&tag);
                    }
                }
            }
        }
    }
}

/// Cache backend holding entries, the tag index and tag generations under a
/// single lock.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    state: RwLock<State>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &CacheKey) -> StorageResult<Option<CachedValue>> {
        let mut state = self.state.write().map_err(|_| StorageError::LockPoisoned)?;
        let found = state.entries.get(key).map(|e| CachedValue {
            value: e.value.clone(),
            cached_at: e.cached_at,
        });
        if found.is_some() {
            state.stats.hits += 1;
        } else {
            state.stats.misses += 1;
        }
        Ok(found)
    }

    async fn watermark(&self, tag: &CacheTag) -> StorageResult<Watermark> {
        let state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(state.generation(tag))
    }

    async fn put(
        &self,
        key: &CacheKey,
        stamps: &[TagStamp],
        value: Value,
        cached_at: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let mut state = self.state.write().map_err(|_| StorageError::LockPoisoned)?;

        if stamps.iter().any(|s| state.generation(&s.tag) != s.watermark) {
            state.stats.stale_puts += 1;
            return Ok(false);
        }

        state.remove_entry(key);
        let tags: BTreeSet<CacheTag> = stamps.iter().map(|s| s.tag.clone()).collect();
        for tag in &tags {
            state
                .tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
        state.entries.insert(
            key.clone(),
            Entry {
                value,
                cached_at,
                tags,
            },
        );
        Ok(true)
    }

    async fn invalidate_tag(&self, tag: &CacheTag) -> StorageResult<u64> {
        let mut state = self.state.write().map_err(|_| StorageError::LockPoisoned)?;

        let next = state.generation(tag).next();
        state.generations.insert(tag.clone(), next);
        state.stats.invalidations += 1;

        let keys = state.tag_index.remove(tag).unwrap_or_default();
        let removed = keys.len() as u64;
        for key in &keys {
            state.remove_entry(key);
        }
        Ok(removed)
    }

    async fn stats(&self) -> StorageResult<CacheStats> {
        let state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(CacheStats {
            entry_count: state.entries.len() as u64,
            ..state.stats.clone()
        })
    }
}
