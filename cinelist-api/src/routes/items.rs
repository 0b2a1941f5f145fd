//! Item List REST API Routes
//!
//! Reads go through the tag-invalidated cache, writes go through
//! [`ItemActions`]. No authentication is required.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Form, Json, Router,
};
use cinelist_core::{Item, ItemSnapshot, Stats};
use cinelist_storage::{CacheRead, ITEMS_KEY, STATS_KEY};
use serde::{Deserialize, Serialize};

use crate::actions::{ItemActions, SelectAck};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::telemetry::metrics;

// ============================================================================
// REQUEST TYPES
// ============================================================================

/// Form body of `POST /api/v1/items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddItemForm {
    pub label: Option<String>,
}

/// JSON body of `PUT /api/v1/items/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EditItemRequest {
    pub label: Option<String>,
}

fn observe<T>(key: &str, read: CacheRead<T>) -> T {
    if let Some(metrics) = metrics() {
        metrics.record_cache_lookup(key, read.was_cache_hit());
    }
    read.into_value()
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/items - Cached item list
#[utoipa::path(
    get,
    path = "/api/v1/items",
    tag = "Items",
    responses(
        (status = 200, description = "Every item in insertion order", body = Vec<Item>),
        (status = 500, description = "Storage failure", body = ApiError),
    ),
)]
pub async fn list_items(State(actions): State<ItemActions>) -> ApiResult<Json<Vec<Item>>> {
    let read = actions.queries().get_items().await?;
    Ok(Json(observe(ITEMS_KEY, read)))
}

/// GET /api/v1/items/stats - Cached item count
#[utoipa::path(
    get,
    path = "/api/v1/items/stats",
    tag = "Items",
    responses(
        (status = 200, description = "Item count", body = Stats),
        (status = 500, description = "Storage failure", body = ApiError),
    ),
)]
pub async fn item_stats(State(actions): State<ItemActions>) -> ApiResult<Json<Stats>> {
    let read = actions.queries().get_stats().await?;
    Ok(Json(observe(STATS_KEY, read)))
}

/// GET /api/v1/items/snapshot - List and stats fetched concurrently
#[utoipa::path(
    get,
    path = "/api/v1/items/snapshot",
    tag = "Items",
    responses(
        (status = 200, description = "List and count from the same cache generation", body = ItemSnapshot),
        (status = 500, description = "Storage failure", body = ApiError),
    ),
)]
pub async fn item_snapshot(State(actions): State<ItemActions>) -> ApiResult<Json<ItemSnapshot>> {
    let read = actions.queries().snapshot().await?;
    let items = observe(ITEMS_KEY, read.items);
    let stats = observe(STATS_KEY, read.stats);
    Ok(Json(ItemSnapshot::new(items, stats)))
}

/// POST /api/v1/items - Add an item (form-encoded)
#[utoipa::path(
    post,
    path = "/api/v1/items",
    tag = "Items",
    request_body(content = AddItemForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid label", body = ApiError),
        (status = 500, description = "Simulated fault", body = ApiError),
    ),
)]
pub async fn add_item(
    State(actions): State<ItemActions>,
    Form(form): Form<AddItemForm>,
) -> ApiResult<impl IntoResponse> {
    let item = actions.add(form.label.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/v1/items/{id} - Replace an item's label
#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    tag = "Items",
    params(("id" = String, Path, description = "Item ID")),
    request_body = EditItemRequest,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 400, description = "Invalid id or label", body = ApiError),
        (status = 404, description = "Item not found", body = ApiError),
        (status = 500, description = "Simulated fault", body = ApiError),
    ),
)]
pub async fn edit_item(
    State(actions): State<ItemActions>,
    Path(id): Path<String>,
    Json(req): Json<EditItemRequest>,
) -> ApiResult<Json<Item>> {
    let item = actions.edit(&id, req.label.as_deref()).await?;
    Ok(Json(item))
}

/// POST /api/v1/items/select - Acknowledge a selection
#[utoipa::path(
    post,
    path = "/api/v1/items/select",
    tag = "Items",
    request_body = Item,
    responses(
        (status = 202, description = "Selection acknowledged", body = SelectAck),
    ),
)]
pub async fn select_item(
    State(actions): State<ItemActions>,
    Json(item): Json<Item>,
) -> ApiResult<impl IntoResponse> {
    let ack = actions.select(&item).await?;
    Ok((StatusCode::ACCEPTED, Json(ack)))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(add_item))
        .route("/stats", get(item_stats))
        .route("/snapshot", get(item_snapshot))
        .route("/select", post(select_item))
        .route("/:id", put(edit_item))
}
