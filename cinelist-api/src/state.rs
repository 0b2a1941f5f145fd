//! Shared application state for Axum routers.

use std::sync::Arc;

use cinelist_storage::{CatalogStore, ItemQueries, ItemStore};

use crate::actions::ItemActions;
use crate::audit::SecurityLogger;
use crate::catalog::CatalogService;
use crate::config::ItemsConfig;
use crate::routes::health::{CatalogProbe, HealthState};

/// Application-wide state shared across all routes.
///
/// Built once at startup. The item store inside `actions` lives as long as
/// the process.
#[derive(Clone)]
pub struct AppState {
    pub actions: ItemActions,
    pub catalog: CatalogService,
    pub health: Arc<HealthState>,
}

impl AppState {
    pub fn new(
        items: &ItemsConfig,
        catalog: Arc<dyn CatalogStore>,
        probe: CatalogProbe,
        audit: SecurityLogger,
    ) -> Self {
        let store = Arc::new(ItemStore::seeded(items.store_latency));
        let queries = ItemQueries::in_memory(store);
        Self {
            actions: ItemActions::new(queries, items.select_latency),
            catalog: CatalogService::new(catalog, audit),
            health: Arc::new(HealthState::new(probe)),
        }
    }
}

crate::impl_from_ref!(ItemActions, actions);
crate::impl_from_ref!(CatalogService, catalog);
crate::impl_from_ref!(Arc<HealthState>, health);
