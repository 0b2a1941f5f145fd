//! Item Mutation Actions
//!
//! Server-side entry points for the item list. Each action validates its
//! input, calls the store, and on success invalidates the shared
//! `items-data` tag so the cached list and stats are dropped together.

use std::time::Duration;

use cinelist_core::{contains_fault_trigger, normalize_label, Item, SIMULATED_FAULT_MESSAGE};
use cinelist_storage::{ItemQueries, ITEMS_TAG};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics;

pub const INVALID_LABEL: &str = "Invalid label";
pub const INVALID_ID_OR_LABEL: &str = "Invalid id or label";

/// An item action as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemAction {
    Add { label: Option<String> },
    Edit { id: String, label: Option<String> },
    Select { item: Item },
}

impl ItemAction {
    pub fn name(&self) -> &'static str {
        match self {
            ItemAction::Add { .. } => "add",
            ItemAction::Edit { .. } => "edit",
            ItemAction::Select { .. } => "select",
        }
    }
}

/// Result of a dispatched action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionOutcome {
    Added { item: Item },
    Edited { item: Item },
    Selected { ack: SelectAck },
}

/// Acknowledgment of a select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SelectAck {
    pub id: String,
    pub acknowledged: bool,
}

/// Add, edit and select over the cached item list.
#[derive(Clone)]
pub struct ItemActions {
    queries: ItemQueries,
    select_latency: Duration,
}

impl std::fmt::Debug for ItemActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemActions")
            .field("select_latency", &self.select_latency)
            .finish_non_exhaustive()
    }
}

impl ItemActions {
    pub fn new(queries: ItemQueries, select_latency: Duration) -> Self {
        Self {
            queries,
            select_latency,
        }
    }

    pub fn queries(&self) -> &ItemQueries {
        &self.queries
    }

    /// Run any action. Every variant is handled here.
    pub async fn dispatch(&self, action: ItemAction) -> ApiResult<ActionOutcome> {
        match action {
            ItemAction::Add { label } => self
                .add(label.as_deref())
                .await
                .map(|item| ActionOutcome::Added { item }),
            ItemAction::Edit { id, label } => self
                .edit(&id, label.as_deref())
                .await
                .map(|item| ActionOutcome::Edited { item }),
            ItemAction::Select { item } => self
                .select(&item)
                .await
                .map(|ack| ActionOutcome::Selected { ack }),
        }
    }

    /// Append a new item.
    ///
    /// Missing or blank labels are rejected, a label containing the fault
    /// trigger fails before the store is touched.
    pub async fn add(&self, label: Option<&str>) -> ApiResult<Item> {
        let result = self.try_add(label).await;
        record("add", result.is_ok());
        result
    }

    async fn try_add(&self, label: Option<&str>) -> ApiResult<Item> {
        let label = label
            .and_then(normalize_label)
            .ok_or_else(|| ApiError::validation_failed(INVALID_LABEL))?;

        if contains_fault_trigger(label) {
            tracing::warn!(action = "add", "Simulated fault triggered");
            return Err(ApiError::simulated_fault(SIMULATED_FAULT_MESSAGE));
        }

        let item = self.queries.store().add(label).await;
        self.invalidate().await?;
        tracing::info!(item_id = %item.id, "Item added");
        Ok(item)
    }

    /// Replace the label of an existing item.
    pub async fn edit(&self, id: &str, label: Option<&str>) -> ApiResult<Item> {
        let result = self.try_edit(id, label).await;
        record("edit", result.is_ok());
        result
    }

    async fn try_edit(&self, id: &str, label: Option<&str>) -> ApiResult<Item> {
        let label = label.and_then(normalize_label);
        let (id, label) = match (id.trim(), label) {
            (id, Some(label)) if !id.is_empty() => (id, label),
            _ => return Err(ApiError::validation_failed(INVALID_ID_OR_LABEL)),
        };

        let item = self.queries.store().edit(id, label).await?;
        self.invalidate().await?;
        tracing::info!(item_id = %item.id, "Item edited");
        Ok(item)
    }

    /// Acknowledge a selection after the configured delay. No side effect.
    pub async fn select(&self, item: &Item) -> ApiResult<SelectAck> {
        tokio::time::sleep(self.select_latency).await;
        tracing::info!(item_id = %item.id, label = %item.label, "Item selected");
        record("select", true);
        Ok(SelectAck {
            id: item.id.clone(),
            acknowledged: true,
        })
    }

    async fn invalidate(&self) -> ApiResult<()> {
        let removed = self.queries.invalidate().await?;
        if let Some(metrics) = metrics() {
            metrics.record_invalidation(ITEMS_TAG);
        }
        tracing::debug!(tag = ITEMS_TAG, removed, "Cache tag invalidated");
        Ok(())
    }
}

fn record(action: &str, success: bool) {
    if let Some(metrics) = metrics() {
        metrics.record_item_mutation(action, success);
    }
}
