//! Middleware modules for the Cinelist API
//!
//! - `auth`: authentication middleware and the `AuthExtractor`
//!
//! Request observability lives in `telemetry::middleware`. Order when layering:
//!
//! ```ignore
//! Router::new()
//!     .route("/api/v1/movies", get(handler))
//!     // Innermost
//!     .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
//!     // Outermost, so rejected requests are still measured
//!     .layer(middleware::from_fn(observability_middleware))
//! ```

mod auth;

pub use auth::{
    auth_middleware, extract_auth_context, AuthExtractor, AuthMiddlewareError,
    AuthMiddlewareState, SESSION_TOKEN_HEADER,
};
