//! Tag generations.
//!
//! Every tag carries a monotonically increasing generation. Invalidating a
//! tag bumps it. A read records the generation before going to storage and
//! the backend refuses to store the result if the generation moved in the
//! meantime, so a slow fetch can never resurrect data that was invalidated
//! while it was in flight.

use super::key::CacheTag;

/// A point in a tag's invalidation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Watermark {
    /// Number of invalidations the tag has seen.
    pub sequence: u64,
}

impl Watermark {
    pub fn new(sequence: u64) -> Self {
        Self { sequence }
    }

    /// Generation of a tag that has never been invalidated.
    pub fn zero() -> Self {
        Self { sequence: 0 }
    }

    /// The generation that follows this one.
    pub fn next(&self) -> Self {
        Self {
            sequence: self.sequence + 1,
        }
    }

    /// Check if this watermark is newer than another.
    pub fn is_newer_than(&self, other: &Watermark) -> bool {
        self.sequence > other.sequence
    }
}

/// A tag together with the generation a reader observed for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagStamp {
    pub tag: CacheTag,
    pub watermark: Watermark,
}

impl TagStamp {
    pub fn new(tag: CacheTag, watermark: Watermark) -> Self {
        Self { tag, watermark }
    }
}
