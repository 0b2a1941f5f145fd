//! In-memory task list with simulated latency.

use std::time::Duration;

use async_trait::async_trait;
use cinelist_core::{
    contains_fault_trigger, new_item_id, EntityType, Item, Stats, StorageError, StorageResult,
    SIMULATED_FAULT_MESSAGE,
};
use tokio::sync::RwLock;

use crate::cache::StorageFetcher;

/// Delay applied to every store operation unless configured otherwise.
pub const DEFAULT_STORE_LATENCY: Duration = Duration::from_millis(200);

/// Rows the store starts with.
pub fn seed_items() -> Vec<Item> {
    (1..=3)
        .map(|n| Item::new(n.to_string(), format!("Task {}", n)))
        .collect()
}

/// The authoritative item list.
///
/// Constructed once per process and shared behind an `Arc`. Every operation
/// sleeps for `latency` before touching the list, standing in for a remote
/// data source.
#[derive(Debug)]
pub struct ItemStore {
    items: RwLock<Vec<Item>>,
    latency: Duration,
}

impl ItemStore {
    pub fn new(items: Vec<Item>, latency: Duration) -> Self {
        Self {
            items: RwLock::new(items),
            latency,
        }
    }

    /// Store holding the three seed rows.
    pub fn seeded(latency: Duration) -> Self {
        Self::new(seed_items(), latency)
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Copy of every item, in insertion order.
    pub async fn list(&self) -> Vec<Item> {
        self.simulate_latency().await;
        self.items.read().await.clone()
    }

    pub async fn stats(&self) -> Stats {
        self.simulate_latency().await;
        Stats {
            total: self.items.read().await.len(),
        }
    }

    /// Append a new item with a fresh id.
    ///
    /// The label is stored as given. Validation belongs to the caller.
    pub async fn add(&self, label: &str) -> Item {
        self.simulate_latency().await;
        let item = Item::new(new_item_id(), label);
        self.items.write().await.push(item.clone());
        tracing::debug!(item_id = %item.id, "item added");
        item
    }

    /// Replace the label of an existing item.
    ///
    /// The fault trigger is checked before the lookup, so a triggering label
    /// fails even for an unknown id.
    pub async fn edit(&self, id: &str, label: &str) -> StorageResult<Item> {
        self.simulate_latency().await;

        if contains_fault_trigger(label) {
            return Err(StorageError::SimulatedFault {
                reason: SIMULATED_FAULT_MESSAGE.to_string(),
            });
        }

        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| StorageError::not_found(EntityType::Item, id))?;
        item.label = label.to_string();
        tracing::debug!(item_id = %id, "item edited");
        Ok(item.clone())
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::seeded(DEFAULT_STORE_LATENCY)
    }
}

#[async_trait]
impl StorageFetcher<Vec<Item>> for ItemStore {
    async fn fetch(&self) -> StorageResult<Vec<Item>> {
        Ok(self.list().await)
    }
}

#[async_trait]
impl StorageFetcher<Stats> for ItemStore {
    async fn fetch(&self) -> StorageResult<Stats> {
        Ok(self.stats().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store() -> ItemStore {
        ItemStore::seeded(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_seeded_store() {
        let store = store();
        let items = store.list().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Item::new("1", "Task 1"));
        assert_eq!(store.stats().await.total, 3);
    }

    #[tokio::test]
    async fn test_add_assigns_fresh_id() {
        let store = store();
        let a = store.add("Task 4").await;
        let b = store.add("Task 4").await;
        assert_ne!(a.id, b.id);
        assert_eq!(store.stats().await.total, 5);
        assert_eq!(store.list().await.last(), Some(&b));
    }

    #[tokio::test]
    async fn test_edit_replaces_label_in_place() {
        let store = store();
        let edited = store.edit("2", "Updated").await.unwrap();
        assert_eq!(edited, Item::new("2", "Updated"));
        let items = store.list().await;
        assert_eq!(items[1].label, "Updated");
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn test_edit_unknown_id_is_not_found() {
        let store = store();
        let err = store.edit("missing", "x").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.list().await, seed_items());
    }

    #[tokio::test]
    async fn test_edit_fault_checked_before_lookup() {
        let store = store();
        let err = store.edit("missing", "an ERROR here").await.unwrap_err();
        assert_eq!(
            err,
            StorageError::SimulatedFault {
                reason: SIMULATED_FAULT_MESSAGE.to_string()
            }
        );

        let err = store.edit("1", "error").await.unwrap_err();
        assert!(matches!(err, StorageError::SimulatedFault { .. }));
        assert_eq!(store.list().await[0].label, "Task 1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_operations_wait_for_latency() {
        let store = ItemStore::seeded(Duration::from_millis(200));
        let start = tokio::time::Instant::now();
        store.list().await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(String),
        Edit(usize, String),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            "[A-Za-z ]{1,12}".prop_map(Op::Add),
            (0usize..8, "[A-Za-z ]{1,12}").prop_map(|(i, l)| Op::Edit(i, l)),
        ]
    }

    proptest! {
        #[test]
        fn prop_stats_match_list(ops in proptest::collection::vec(op_strategy(), 0..20)) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
            rt.block_on(async {
                let store = store();
                let mut expected = 3usize;
                for op in ops {
                    match op {
                        Op::Add(label) => {
                            store.add(&label).await;
                            expected += 1;
                        }
                        Op::Edit(i, label) => {
                            let id = (i + 1).to_string();
                            let _ = store.edit(&id, &label).await;
                        }
                    }
                }
                let items = store.list().await;
                let stats = store.stats().await;
                assert_eq!(items.len(), expected);
                assert_eq!(stats.total, items.len());
            });
        }
    }
}
