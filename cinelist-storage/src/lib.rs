//! Cinelist Storage - Item Store, Cache and Catalog Seams
//!
//! - [`items`]: the authoritative in-memory task list.
//! - [`cache`]: tag-invalidated read-through cache.
//! - [`queries`]: cached item reads sharing the `items-data` tag.
//! - [`catalog`]: catalog and session lookup traits with an in-memory
//!   implementation. The Postgres implementation lives in `cinelist-api`.

pub mod cache;
pub mod catalog;
pub mod items;
pub mod queries;

pub use cache::{
    CacheBackend, CacheKey, CacheRead, CacheStats, CacheTag, CachedValue, InMemoryCacheBackend,
    StorageFetcher, TagStamp, TaggedCache, Watermark,
};
pub use catalog::{sample_catalog, CatalogStore, InMemoryCatalog, SessionLookup, SessionWithUser};
pub use items::{seed_items, ItemStore, DEFAULT_STORE_LATENCY};
pub use queries::{ItemQueries, SnapshotRead, ITEMS_KEY, ITEMS_TAG, STATS_KEY};
