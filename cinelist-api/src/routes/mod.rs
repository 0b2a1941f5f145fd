//! REST API Routes Module
//!
//! - `/api/v1/items/*`: the cached item list (public)
//! - `/api/v1/movies/*`, `/api/v1/directors/*`: catalog procedures (authenticated)
//! - `/health/*`: Kubernetes-compatible probes
//! - `/metrics`, `/openapi.json`

pub mod directors;
pub mod health;
pub mod items;
pub mod movies;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use cinelist_storage::SessionLookup;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::auth::AuthConfig;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{auth_middleware, AuthMiddlewareState, SESSION_TOKEN_HEADER};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

fn is_production_environment() -> bool {
    std::env::var("CINELIST_ENVIRONMENT")
        .map(|e| matches!(e.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set CINELIST_CORS_ORIGINS.",
        ));
    }
    Ok(())
}

// ============================================================================
// SECURE ROUTER BUILDER
// ============================================================================

/// Builder for the API router.
///
/// Catalog routes sit behind `auth_middleware`. Item routes, health probes,
/// metrics and the OpenAPI document are public.
pub struct SecureRouterBuilder {
    state: AppState,
    api_config: ApiConfig,
    auth_state: AuthMiddlewareState,
}

impl SecureRouterBuilder {
    /// In production, refuses insecure auth or CORS configuration.
    pub fn new(
        state: AppState,
        api_config: ApiConfig,
        auth_config: AuthConfig,
        sessions: Arc<dyn SessionLookup>,
    ) -> ApiResult<Self> {
        if is_production_environment() {
            auth_config.validate_for_production()?;
            validate_api_config_for_production(&api_config)?;
        }

        Ok(Self {
            state,
            api_config,
            auth_state: AuthMiddlewareState::new(auth_config, sessions),
        })
    }

    fn build_catalog_routes(&self) -> Router<AppState> {
        Router::new()
            .nest("/movies", movies::create_router())
            .nest("/directors", directors::create_router())
            .layer(from_fn_with_state(self.auth_state.clone(), auth_middleware))
    }

    /// Build the complete router.
    ///
    /// # Middleware Order (outer to inner)
    /// 1. CORS (outermost) - handles preflight requests
    /// 2. Trace + observability - spans, metrics, completion logs
    /// 3. Auth (only on catalog routes)
    pub fn build(self) -> Router {
        let api_routes = Router::new()
            .nest("/items", items::create_router())
            .merge(self.build_catalog_routes());

        let cors = build_cors_layer(&self.api_config);

        Router::new()
            .nest("/api/v1", api_routes)
            .nest("/health", health::create_router())
            .route("/metrics", get(metrics_handler))
            .route("/openapi.json", get(openapi_json))
            .with_state(self.state)
            .layer(from_fn(observability_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static(SESSION_TOKEN_HEADER),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

/// Create the complete API router.
pub fn create_api_router(
    state: AppState,
    api_config: &ApiConfig,
    auth_config: AuthConfig,
    sessions: Arc<dyn SessionLookup>,
) -> ApiResult<Router> {
    SecureRouterBuilder::new(state, api_config.clone(), auth_config, sessions)
        .map(SecureRouterBuilder::build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::SecurityLogger;
    use crate::config::ItemsConfig;
    use crate::routes::health::CatalogProbe;
    use axum::{body::Body, http::Request, http::StatusCode};
    use cinelist_storage::sample_catalog;
    use tower::ServiceExt;

    fn router() -> Result<Router, String> {
        let catalog = Arc::new(sample_catalog().map_err(|e| e.to_string())?);
        let state = AppState::new(
            &ItemsConfig::instant(),
            catalog.clone(),
            CatalogProbe::Memory,
            SecurityLogger::default(),
        );
        create_api_router(state, &ApiConfig::default(), AuthConfig::default(), catalog)
            .map_err(|e| e.to_string())
    }

    #[tokio::test]
    async fn test_public_and_protected_routes() -> Result<(), String> {
        let app = router()?;
        let cases = [
            ("/health/ping", StatusCode::OK),
            ("/openapi.json", StatusCode::OK),
            ("/api/v1/items", StatusCode::OK),
            ("/api/v1/movies", StatusCode::UNAUTHORIZED),
            ("/api/v1/directors", StatusCode::UNAUTHORIZED),
        ];
        for (uri, expected) in cases {
            let request = Request::builder()
                .uri(uri)
                .body(Body::empty())
                .map_err(|e| e.to_string())?;
            let response = app
                .clone()
                .oneshot(request)
                .await
                .map_err(|e| format!("Request failed: {:?}", e))?;
            assert_eq!(response.status(), expected, "{}", uri);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_session_header() -> Result<(), String> {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/movies")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, SESSION_TOKEN_HEADER)
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = router()?
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        Ok(())
    }
}
