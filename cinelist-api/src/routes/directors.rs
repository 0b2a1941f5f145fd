//! Director REST API Routes

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use cinelist_core::DirectorWithMovies;

use crate::catalog::CatalogService;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthExtractor;
use crate::state::AppState;

/// GET /api/v1/directors - Every director with their movies
#[utoipa::path(
    get,
    path = "/api/v1/directors",
    tag = "Directors",
    responses(
        (status = 200, description = "All directors", body = Vec<DirectorWithMovies>),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Failed to fetch directors", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = []),
        ("session_token" = [])
    )
)]
pub async fn list_directors(
    State(catalog): State<CatalogService>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<Vec<DirectorWithMovies>>> {
    Ok(Json(catalog.list_directors(&auth).await?))
}

/// GET /api/v1/directors/{id} - One director with their movies
#[utoipa::path(
    get,
    path = "/api/v1/directors/{id}",
    tag = "Directors",
    params(("id" = String, Path, description = "Director ID")),
    responses(
        (status = 200, description = "Director found", body = DirectorWithMovies),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Director not found", body = ApiError),
        (status = 500, description = "Failed to fetch director", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = []),
        ("session_token" = [])
    )
)]
pub async fn get_director(
    State(catalog): State<CatalogService>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<String>,
) -> ApiResult<Json<DirectorWithMovies>> {
    Ok(Json(catalog.get_director(&auth, &id).await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_directors))
        .route("/:id", get(get_director))
}
