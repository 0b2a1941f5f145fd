//! Cache layer with tag-based invalidation.
//!
//! Independent reads are cached under their own [`CacheKey`] and grouped by
//! one or more [`CacheTag`]s. Invalidating a tag removes every entry that
//! carries it in a single backend operation, so two reads sharing a tag can
//! never be observed half-invalidated.
//!
//! Each tag has a [`Watermark`] generation. Reads that started before an
//! invalidation do not write their results back after it.
//!
//! # Example
//!
//! ```ignore
//! let cache = TaggedCache::new(Arc::new(InMemoryCacheBackend::new()));
//! let read = cache.get_or_fetch::<Stats, _>(&STATS_KEY, &[ITEMS_TAG], &store).await?;
//! if read.was_cache_hit() {
//!     tracing::debug!("served from cache");
//! }
//! cache.invalidate_tag(&ITEMS_TAG).await?;
//! ```

pub mod key;
pub mod memory;
pub mod read;
pub mod tagged;
pub mod traits;
pub mod watermark;

pub use key::{CacheKey, CacheTag};
pub use memory::InMemoryCacheBackend;
pub use read::CacheRead;
pub use tagged::{StorageFetcher, TaggedCache};
pub use traits::{CacheBackend, CacheStats, CachedValue};
pub use watermark::{TagStamp, Watermark};
