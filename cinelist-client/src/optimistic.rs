//! Optimistic view of the item list.
//!
//! The authoritative base is the last server snapshot. Mutations issued by
//! the user are layered on top until the server confirms or rejects them:
//!
//! ```text
//! Idle --apply--> PendingOptimistic --fail--> RolledBack
//!                        |                        |
//!                   confirm + reconcile       reconcile
//!                        v                        v
//!                   Reconciled <------------------+
//! ```
//!
//! A failed mutation leaves the speculative view at once. A confirmed one
//! stays until a snapshot that was requested after the confirmation is
//! reconciled. Refreshes run concurrently with mutations, so every snapshot
//! request takes a [`RefreshTicket`] and `reconcile` uses it to tell which
//! confirmations the snapshot can already contain. Snapshots older than the
//! last one applied are ignored.
//!
//! Adds are matched to server rows by id once confirmed. Before that, a
//! new server row with the same label is claimed by the oldest matching add,
//! so a refresh that overtakes the add response never shows the item twice.

use cinelist_core::{Item, ItemSnapshot, Stats};

/// A speculative change to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimisticAction {
    /// Append an item. Stats grow by one.
    Add(Item),
    /// Replace the label of the item with `id`. Unknown ids are ignored.
    Edit { id: String, label: String },
}

/// Handle for one applied mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(u64);

/// Sequence number of a snapshot request, taken before the request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    Idle,
    PendingOptimistic,
    Reconciled,
    RolledBack,
}

#[derive(Debug, Clone)]
struct PendingMutation {
    id: MutationId,
    action: OptimisticAction,
    /// Last ticket issued when the server confirmed. Snapshots with a later
    /// ticket include the mutation.
    confirmed_at: Option<u64>,
}

impl PendingMutation {
    fn added_id(&self) -> Option<&str> {
        match &self.action {
            OptimisticAction::Add(item) => Some(item.id.as_str()),
            OptimisticAction::Edit { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OptimisticList {
    base: ItemSnapshot,
    pending: Vec<PendingMutation>,
    next_id: u64,
    issued: u64,
    applied: Option<u64>,
    phase: Option<MutationPhase>,
    last_error: Option<String>,
}

impl OptimisticList {
    pub fn new(base: ItemSnapshot) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> MutationPhase {
        self.phase.unwrap_or(MutationPhase::Idle)
    }

    /// Error of the most recent rollback, cleared by the next apply.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn base(&self) -> &ItemSnapshot {
        &self.base
    }

    /// Number of mutations still layered over the base.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: MutationId) -> bool {
        self.pending
            .iter()
            .any(|m| m.id == id && m.confirmed_at.is_none())
    }

    /// Ticket for a snapshot request about to be sent.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Layer a mutation over the current view.
    pub fn apply(&mut self, action: OptimisticAction) -> MutationId {
        let id = MutationId(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingMutation {
            id,
            action,
            confirmed_at: None,
        });
        self.phase = Some(MutationPhase::PendingOptimistic);
        self.last_error = None;
        id
    }

    /// The server accepted the mutation. It stays visible until a snapshot
    /// requested after this point is reconciled.
    ///
    /// `stored` is the row the server returned. It replaces the speculative
    /// item, so an add carries the server id from here on.
    pub fn confirm(&mut self, id: MutationId, stored: Option<Item>) -> bool {
        let issued = self.issued;
        let Some(mutation) = self.pending.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        mutation.confirmed_at = Some(issued);
        if let Some(stored) = stored {
            match &mut mutation.action {
                OptimisticAction::Add(item) => *item = stored,
                OptimisticAction::Edit { label, .. } => *label = stored.label,
            }
        }
        true
    }

    /// The server rejected the mutation. It is removed immediately.
    pub fn fail(&mut self, id: MutationId, error: impl Into<String>) -> bool {
        let before = self.pending.len();
        self.pending.retain(|m| m.id != id);
        if self.pending.len() == before {
            return false;
        }
        self.phase = Some(MutationPhase::RolledBack);
        self.last_error = Some(error.into());
        true
    }

    /// Replace the base with the snapshot fetched under `ticket`.
    ///
    /// Returns false, changing nothing, when a snapshot with a later ticket
    /// was already applied. Confirmed mutations are dropped when the
    /// snapshot was requested after their confirmation, or when it already
    /// holds the row they added.
    pub fn reconcile(&mut self, snapshot: ItemSnapshot, ticket: RefreshTicket) -> bool {
        if self.applied.is_some_and(|applied| applied >= ticket.0) {
            return false;
        }
        let had_base = self.applied.replace(ticket.0).is_some();
        let previous = std::mem::replace(&mut self.base, snapshot);
        if had_base {
            self.claim_new_rows(&previous);
        }

        let base = &self.base;
        self.pending.retain(|m| match m.confirmed_at {
            Some(at) if at < ticket.0 => false,
            Some(_) => !m.added_id().is_some_and(|id| contains(base, id)),
            None => true,
        });

        if self.pending.is_empty() {
            if self.phase() != MutationPhase::RolledBack {
                self.phase = Some(MutationPhase::Reconciled);
            }
        } else {
            self.phase = Some(MutationPhase::PendingOptimistic);
        }
        true
    }

    /// Give unconfirmed adds the id of a row that appeared since the
    /// previous base with the same label. Each row is claimed once.
    fn claim_new_rows(&mut self, previous: &ItemSnapshot) {
        let mut fresh: Vec<&Item> = self
            .base
            .items
            .iter()
            .filter(|row| !contains(previous, &row.id))
            .filter(|row| {
                !self
                    .pending
                    .iter()
                    .any(|m| m.added_id() == Some(row.id.as_str()))
            })
            .collect();
        for mutation in &mut self.pending {
            if mutation.confirmed_at.is_some() {
                continue;
            }
            let OptimisticAction::Add(item) = &mut mutation.action else {
                continue;
            };
            if contains(&self.base, &item.id) {
                continue;
            }
            if let Some(pos) = fresh.iter().position(|row| row.label == item.label) {
                *item = fresh.remove(pos).clone();
            }
        }
    }

    /// True for items that exist only in the speculative view.
    pub fn is_unsynced(&self, id: &str) -> bool {
        !contains(&self.base, id)
    }

    /// Items as the user should see them.
    pub fn items(&self) -> Vec<Item> {
        let mut items = self.base.items.clone();
        for mutation in &self.pending {
            match &mutation.action {
                OptimisticAction::Add(item) => {
                    if !contains(&self.base, &item.id) {
                        items.push(item.clone());
                    }
                }
                OptimisticAction::Edit { id, label } => {
                    if let Some(item) = items.iter_mut().find(|i| &i.id == id) {
                        item.label = label.clone();
                    }
                }
            }
        }
        items
    }

    /// Stats as the user should see them.
    pub fn stats(&self) -> Stats {
        let added = self
            .pending
            .iter()
            .filter_map(PendingMutation::added_id)
            .filter(|id| !contains(&self.base, id))
            .count();
        Stats {
            total: self.base.stats.total + added,
        }
    }
}

fn contains(snapshot: &ItemSnapshot, id: &str) -> bool {
    snapshot.items.iter().any(|item| item.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(items: Vec<Item>) -> ItemSnapshot {
        let stats = Stats::of(&items);
        ItemSnapshot::new(items, stats)
    }

    fn seed_items() -> Vec<Item> {
        vec![
            Item::new("1", "Task 1"),
            Item::new("2", "Task 2"),
            Item::new("3", "Task 3"),
        ]
    }

    fn seeded() -> OptimisticList {
        let mut list = OptimisticList::default();
        let ticket = list.begin_refresh();
        assert!(list.reconcile(snapshot(seed_items()), ticket));
        list
    }

    fn with_row(list: &OptimisticList, id: &str, label: &str) -> ItemSnapshot {
        let mut items = list.base().items.clone();
        items.push(Item::new(id, label));
        snapshot(items)
    }

    fn labels(list: &OptimisticList) -> Vec<String> {
        list.items().into_iter().map(|i| i.label).collect()
    }

    #[test]
    fn test_add_is_visible_before_confirmation() {
        let mut list = OptimisticList::new(snapshot(seed_items()));
        assert_eq!(list.phase(), MutationPhase::Idle);

        let id = list.apply(OptimisticAction::Add(Item::new("tmp-1", "Task 4")));
        assert_eq!(list.phase(), MutationPhase::PendingOptimistic);
        assert!(list.is_pending(id));
        assert_eq!(list.items().len(), 4);
        assert_eq!(list.stats().total, 4);
        assert!(list.is_unsynced("tmp-1"));
        assert!(!list.is_unsynced("1"));
    }

    #[test]
    fn test_failed_add_rolls_back_immediately() {
        let mut list = seeded();
        let id = list.apply(OptimisticAction::Add(Item::new("tmp-1", "an error")));

        assert!(list.fail(id, "Simulated server error"));
        assert_eq!(list.phase(), MutationPhase::RolledBack);
        assert_eq!(list.last_error(), Some("Simulated server error"));
        assert_eq!(list.items().len(), 3);
        assert_eq!(list.stats().total, 3);
        assert!(!list.fail(id, "again"));
    }

    #[test]
    fn test_edit_replaces_label_and_rolls_back() {
        let mut list = seeded();
        let id = list.apply(OptimisticAction::Edit {
            id: "2".to_string(),
            label: "Updated".to_string(),
        });
        assert_eq!(list.items()[1].label, "Updated");
        assert_eq!(list.stats().total, 3);

        list.fail(id, "nope");
        assert_eq!(list.items()[1].label, "Task 2");
    }

    #[test]
    fn test_edit_of_unknown_id_changes_nothing() {
        let mut list = seeded();
        list.apply(OptimisticAction::Edit {
            id: "99".to_string(),
            label: "Ghost".to_string(),
        });
        assert_eq!(list.items(), list.base().items);
    }

    #[test]
    fn test_reconcile_drops_confirmed_and_keeps_unconfirmed() {
        let mut list = seeded();
        let confirmed = list.apply(OptimisticAction::Add(Item::new("tmp-1", "Task 4")));
        let _open = list.apply(OptimisticAction::Add(Item::new("tmp-2", "Task 5")));
        list.confirm(confirmed, Some(Item::new("17", "Task 4")));

        let ticket = list.begin_refresh();
        let fresh = with_row(&list, "17", "Task 4");
        assert!(list.reconcile(fresh, ticket));

        assert_eq!(list.pending_len(), 1);
        assert_eq!(list.phase(), MutationPhase::PendingOptimistic);
        assert_eq!(labels(&list), vec!["Task 1", "Task 2", "Task 3", "Task 4", "Task 5"]);
        assert_eq!(list.stats().total, 5);
    }

    #[test]
    fn test_reconcile_after_confirm_reaches_reconciled() {
        let mut list = seeded();
        let id = list.apply(OptimisticAction::Edit {
            id: "1".to_string(),
            label: "First".to_string(),
        });
        assert!(list.confirm(id, None));
        assert!(!list.is_pending(id));

        let ticket = list.begin_refresh();
        let mut items = list.base().items.clone();
        items[0].label = "First".to_string();
        list.reconcile(snapshot(items), ticket);

        assert_eq!(list.phase(), MutationPhase::Reconciled);
        assert_eq!(list.pending_len(), 0);
        assert_eq!(list.items()[0].label, "First");
    }

    #[test]
    fn test_snapshot_requested_before_confirm_keeps_the_add() {
        let mut list = seeded();
        let stale_ticket = list.begin_refresh();
        let stale = snapshot(seed_items());

        let id = list.apply(OptimisticAction::Add(Item::new("tmp-1", "Task 4")));
        list.confirm(id, Some(Item::new("17", "Task 4")));
        list.reconcile(stale, stale_ticket);

        assert_eq!(list.items().len(), 4);
        assert_eq!(list.stats().total, 4);
        assert_eq!(list.pending_len(), 1);
        assert_eq!(list.phase(), MutationPhase::PendingOptimistic);

        let ticket = list.begin_refresh();
        let fresh = with_row(&list, "17", "Task 4");
        list.reconcile(fresh, ticket);
        assert_eq!(list.pending_len(), 0);
        assert_eq!(list.items().len(), 4);
        assert_eq!(list.phase(), MutationPhase::Reconciled);
    }

    #[test]
    fn test_stale_edit_snapshot_keeps_confirmed_label() {
        let mut list = seeded();
        let stale_ticket = list.begin_refresh();
        let id = list.apply(OptimisticAction::Edit {
            id: "2".to_string(),
            label: "Updated".to_string(),
        });
        list.confirm(id, Some(Item::new("2", "Updated")));

        list.reconcile(snapshot(seed_items()), stale_ticket);
        assert_eq!(list.items()[1].label, "Updated");
    }

    #[test]
    fn test_out_of_order_snapshots_are_ignored() {
        let mut list = seeded();
        let older = list.begin_refresh();
        let newer = list.begin_refresh();

        let mut grown = seed_items();
        grown.push(Item::new("4", "Task 4"));
        assert!(list.reconcile(snapshot(grown), newer));
        assert!(!list.reconcile(snapshot(seed_items()), older));

        assert_eq!(list.base().items.len(), 4);
        assert_eq!(list.stats().total, 4);
    }

    #[test]
    fn test_snapshot_overtaking_add_response_counts_item_once() {
        let mut list = seeded();
        let id = list.apply(OptimisticAction::Add(Item::new("tmp-1", "Task 4")));

        let ticket = list.begin_refresh();
        let fresh = with_row(&list, "17", "Task 4");
        list.reconcile(fresh, ticket);

        assert_eq!(list.items().len(), 4);
        assert_eq!(list.stats().total, 4);
        assert!(!list.is_unsynced("17"));
        assert!(list.is_pending(id));

        assert!(list.confirm(id, Some(Item::new("17", "Task 4"))));
        assert_eq!(list.items().len(), 4);
        assert_eq!(list.stats().total, 4);
    }

    #[test]
    fn test_confirmed_add_matches_server_row_by_id() {
        let mut list = seeded();
        let stale_ticket = list.begin_refresh();
        let id = list.apply(OptimisticAction::Add(Item::new("tmp-1", "Task 4")));
        list.confirm(id, Some(Item::new("17", "Task 4")));

        let fresh = with_row(&list, "17", "Task 4");
        list.reconcile(fresh, stale_ticket);

        assert_eq!(list.pending_len(), 0);
        assert_eq!(list.items().len(), 4);
        assert_eq!(list.stats().total, 4);
    }

    #[test]
    fn test_claims_only_rows_that_are_new() {
        let mut list = seeded();
        list.apply(OptimisticAction::Add(Item::new("tmp-1", "Task 1")));

        let ticket = list.begin_refresh();
        list.reconcile(snapshot(seed_items()), ticket);

        assert_eq!(list.items().len(), 4);
        assert!(list.is_unsynced("tmp-1"));
    }
}
