//! OpenAPI document for the Cinelist API
//!
//! Built with utoipa from the route annotations and the shared entity types.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::actions::{ActionOutcome, SelectAck};
use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::items::{AddItemForm, EditItemRequest};
use crate::routes::{directors, health, items, movies};
use crate::telemetry::metrics;

use cinelist_core::{
    Director, DirectorProfile, DirectorSummary, DirectorWithMovies, Item, ItemSnapshot, Movie,
    MovieListEntry, MovieSummary, MovieWithDirector, Stats,
};

/// OpenAPI document for the Cinelist API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cinelist API",
        version = "0.1.0",
        description = "Cached task list and authenticated movie catalog",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Items", description = "Cached task list with tag invalidation"),
        (name = "Movies", description = "Movie catalog reads"),
        (name = "Directors", description = "Director catalog reads"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Metrics", description = "Prometheus exposition")
    ),
    paths(
        items::list_items,
        items::item_stats,
        items::item_snapshot,
        items::add_item,
        items::edit_item,
        items::select_item,
        movies::list_movies,
        movies::get_movie,
        directors::list_directors,
        directors::get_director,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            Item,
            Stats,
            ItemSnapshot,
            AddItemForm,
            EditItemRequest,
            SelectAck,
            ActionOutcome,
            Movie,
            Director,
            DirectorProfile,
            DirectorSummary,
            MovieSummary,
            MovieWithDirector,
            MovieListEntry,
            DirectorWithMovies,
            HealthResponse,
            HealthStatus,
            HealthDetails,
            ComponentHealth,
            ApiError,
            ErrorCode,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );

            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );

            // Browser clients send the same token as the `cinelist_session` cookie.
            components.add_security_scheme(
                "session_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Session-Token"))),
            );
        }
    }
}

impl ApiDoc {
    /// Render the OpenAPI document as pretty JSON.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Cinelist API");

        let tags = openapi
            .tags
            .as_ref()
            .ok_or_else(|| "OpenAPI tags missing".to_string())?;
        assert_eq!(tags.len(), 5);

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        for scheme in ["api_key", "bearer_auth", "session_token"] {
            assert!(components.security_schemes.contains_key(scheme), "{}", scheme);
        }
        assert!(components.schemas.contains_key("ItemSnapshot"));
        Ok(())
    }

    #[test]
    fn test_openapi_paths_exist() {
        let openapi = ApiDoc::openapi();
        for path in [
            "/api/v1/items",
            "/api/v1/items/stats",
            "/api/v1/items/snapshot",
            "/api/v1/items/{id}",
            "/api/v1/items/select",
            "/api/v1/movies",
            "/api/v1/movies/{id}",
            "/api/v1/directors",
            "/api/v1/directors/{id}",
            "/health/ready",
            "/metrics",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "{}", path);
        }
    }

    #[test]
    fn test_openapi_json_serialization() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        serde_json::from_str::<serde_json::Value>(&json)
            .map_err(|e| format!("Generated JSON invalid: {}", e))?;
        assert!(json.contains("\"session_token\""));
        Ok(())
    }
}
