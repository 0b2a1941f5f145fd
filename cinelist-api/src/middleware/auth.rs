//! Axum Middleware for Authentication
//!
//! This module provides Axum middleware that:
//! - Authenticates requests using API keys, JWT tokens or session tokens
//! - Injects AuthContext into request extensions
//! - Returns 401 for unauthenticated requests before any handler runs

use crate::auth::{authenticate, authenticate_session, session_token_from_cookie, AuthConfig, AuthContext};
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cinelist_storage::SessionLookup;
use std::sync::Arc;

/// Header carrying a provider-issued session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,

    /// Resolves session tokens to their owning user.
    pub sessions: Arc<dyn SessionLookup>,
}

impl std::fmt::Debug for AuthMiddlewareState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMiddlewareState")
            .field("auth_config", &self.auth_config)
            .field("sessions", &"<SessionLookup>")
            .finish()
    }
}

impl AuthMiddlewareState {
    pub fn new(auth_config: AuthConfig, sessions: Arc<dyn SessionLookup>) -> Self {
        Self {
            auth_config: Arc::new(auth_config),
            sessions,
        }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

fn session_token(request: &Request) -> Option<String> {
    let headers = request.headers();
    if let Some(token) = headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(session_token_from_cookie)
        .map(str::to_string)
}

/// Axum middleware for authentication.
///
/// API key and bearer credentials take precedence. A session token is only
/// consulted when neither is present.
///
/// ```ignore
/// use axum::{Router, middleware};
///
/// let app = Router::new()
///     .route("/api/v1/movies", axum::routing::get(list_movies))
///     .layer(middleware::from_fn_with_state(auth_state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let api_key_header = request
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok());

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let auth_context = if api_key_header.is_some() || auth_header.is_some() {
        authenticate(&state.auth_config, api_key_header, auth_header)
    } else if let Some(token) = session_token(&request) {
        authenticate_session(&state.auth_config, state.sessions.as_ref(), &token).await
    } else {
        authenticate(&state.auth_config, None, None)
    }
    .map_err(AuthMiddlewareError)?;

    tracing::debug!(
        user_id = %auth_context.user_id,
        method = auth_context.auth_method.as_str(),
        "Request authenticated"
    );

    request.extensions_mut().insert(auth_context);
    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for authentication context.
///
/// `auth_middleware` must run on the route. Without it the extractor rejects
/// with 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Extract AuthContext from request extensions.
pub fn extract_auth_context(request: &Request) -> ApiResult<&AuthContext> {
    request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::unauthorized("Auth context missing from request"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt_token, test_clocks, AuthMethod, JwtSecret};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::Duration;
    use cinelist_core::{Session, User};
    use cinelist_storage::InMemoryCatalog;
    use tower::ServiceExt; // for `oneshot`
    use uuid::Uuid;

    fn test_auth_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.add_api_key("test_key_123".to_string());
        config.jwt_secret =
            JwtSecret::new("test_secret".to_string()).expect("test secret should be valid");
        config.clock = Arc::new(test_clocks::valid());
        config
    }

    fn test_sessions() -> Arc<InMemoryCatalog> {
        let now = chrono::DateTime::from_timestamp(test_clocks::valid().0, 0)
            .expect("valid timestamp")
            .naive_utc();
        let user_id = Uuid::new_v4();
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_user(User {
                id: user_id,
                name: Some("Viewer".to_string()),
                email: "viewer@example.com".to_string(),
                email_verified: true,
                image: None,
                created_at: now,
                updated_at: now,
            })
            .expect("insert user");
        catalog
            .insert_session(Session {
                id: Uuid::new_v4(),
                user_id,
                expires_at: now + Duration::days(7),
                token: "valid-session".to_string(),
                ip_address: None,
                user_agent: None,
                created_at: now,
                updated_at: now,
            })
            .expect("insert session");
        Arc::new(catalog)
    }

    fn test_app() -> Router {
        let auth_state = AuthMiddlewareState::new(test_auth_config(), test_sessions());

        Router::new()
            .route(
                "/protected",
                get(|AuthExtractor(auth): AuthExtractor| async move {
                    format!("{}:{}", auth.auth_method.as_str(), auth.user_id)
                }),
            )
            .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
    }

    async fn status_of(request: Request<Body>) -> Result<StatusCode, String> {
        let response = test_app()
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        Ok(response.status())
    }

    async fn body_of(request: Request<Body>) -> Result<String, String> {
        let response = test_app()
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
    }

    #[tokio::test]
    async fn test_middleware_with_valid_api_key() -> Result<(), String> {
        let request = Request::builder()
            .uri("/protected")
            .header("x-api-key", "test_key_123")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        assert_eq!(body_of(request).await?, "api_key:api_key_test_key");
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_invalid_api_key() -> Result<(), String> {
        let request = Request::builder()
            .uri("/protected")
            .header("x-api-key", "invalid_key")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        assert_eq!(status_of(request).await?, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_without_authentication() -> Result<(), String> {
        let request = Request::builder()
            .uri("/protected")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        assert_eq!(status_of(request).await?, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_valid_jwt() -> Result<(), String> {
        let token = generate_jwt_token(&test_auth_config(), "user-42".to_string(), vec![])
            .map_err(|e| e.to_string())?;
        let request = Request::builder()
            .uri("/protected")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        assert_eq!(body_of(request).await?, "jwt:user-42");
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_malformed_auth_header() -> Result<(), String> {
        let request = Request::builder()
            .uri("/protected")
            .header("authorization", "Token abc")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        assert_eq!(status_of(request).await?, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_session_header_and_cookie() -> Result<(), String> {
        let request = Request::builder()
            .uri("/protected")
            .header(SESSION_TOKEN_HEADER, "valid-session")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        assert!(body_of(request).await?.starts_with(AuthMethod::Session.as_str()));

        let request = Request::builder()
            .uri("/protected")
            .header("cookie", "theme=dark; cinelist_session=valid-session")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        assert_eq!(status_of(request).await?, StatusCode::OK);

        let request = Request::builder()
            .uri("/protected")
            .header("cookie", "cinelist_session=forged")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        assert_eq!(status_of(request).await?, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_auth_extractor_without_middleware() -> Result<(), String> {
        let app = Router::new().route(
            "/unprotected",
            get(|AuthExtractor(_): AuthExtractor| async { "unreachable" }),
        );
        let request = Request::builder()
            .uri("/unprotected")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }
}
