//! Task list entities.

use serde::{Deserialize, Serialize};

/// A labeled entry in the task list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Item {
    pub id: String,
    pub label: String,
}

impl Item {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Aggregate view over the task list. Never stored, always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Stats {
    pub total: usize,
}

impl Stats {
    /// Derive stats from a list of items.
    pub fn of(items: &[Item]) -> Self {
        Self { total: items.len() }
    }
}

/// The list and its stats, fetched together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ItemSnapshot {
    pub items: Vec<Item>,
    pub stats: Stats,
}

impl ItemSnapshot {
    pub fn new(items: Vec<Item>, stats: Stats) -> Self {
        Self { items, stats }
    }

    /// True when the count agrees with the list. Both views come from the
    /// same cache generation, so a disagreement means a partial invalidation.
    pub fn is_consistent(&self) -> bool {
        self.items.len() == self.stats.total
    }
}
