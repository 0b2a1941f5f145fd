//! Movie REST API Routes
//!
//! Both handlers require an authenticated actor and write a security record.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use cinelist_core::{MovieListEntry, MovieWithDirector};

use crate::catalog::CatalogService;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthExtractor;
use crate::state::AppState;

/// GET /api/v1/movies - Every movie with a director summary
#[utoipa::path(
    get,
    path = "/api/v1/movies",
    tag = "Movies",
    responses(
        (status = 200, description = "All movies", body = Vec<MovieListEntry>),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Failed to fetch movies", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = []),
        ("session_token" = [])
    )
)]
pub async fn list_movies(
    State(catalog): State<CatalogService>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<Vec<MovieListEntry>>> {
    Ok(Json(catalog.list_movies(&auth).await?))
}

/// GET /api/v1/movies/{id} - One movie with its director's profile
#[utoipa::path(
    get,
    path = "/api/v1/movies/{id}",
    tag = "Movies",
    params(("id" = String, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie found", body = MovieWithDirector),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Movie not found", body = ApiError),
        (status = 500, description = "Failed to fetch movie", body = ApiError),
    ),
    security(
        ("api_key" = []),
        ("bearer_auth" = []),
        ("session_token" = [])
    )
)]
pub async fn get_movie(
    State(catalog): State<CatalogService>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<String>,
) -> ApiResult<Json<MovieWithDirector>> {
    Ok(Json(catalog.get_movie(&auth, &id).await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_movies))
        .route("/:id", get(get_movie))
}
