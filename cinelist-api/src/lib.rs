//! Cinelist API - REST Layer
//!
//! Axum server exposing two surfaces over shared state:
//!
//! - the task list, read through a tag-invalidated cache and mutated by
//!   add, edit and select actions (public);
//! - the movie catalog, read by authenticated procedures that each write a
//!   security audit record.
//!
//! Catalog reads and session lookups go to PostgreSQL through
//! deadpool-postgres, or to the seeded in-memory catalog when
//! `CINELIST_CATALOG_BACKEND=memory`.

#[macro_use]
pub mod macros;

pub mod actions;
pub mod audit;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use actions::{ActionOutcome, ItemAction, ItemActions, SelectAck};
pub use audit::{AuditSink, AuditStatus, MemoryAuditSink, SecurityEvent, SecurityLogger};
pub use auth::{
    authenticate, authenticate_api_key, authenticate_jwt, authenticate_session,
    generate_jwt_token, validate_api_key, validate_jwt_token, AuthConfig, AuthContext,
    AuthMethod, Claims, SESSION_COOKIE,
};
pub use catalog::{CatalogProcedure, CatalogService};
pub use config::{ApiConfig, CatalogBackend, ItemsConfig};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{
    auth_middleware, extract_auth_context, AuthExtractor, AuthMiddlewareState,
    SESSION_TOKEN_HEADER,
};
pub use openapi::ApiDoc;
pub use routes::{create_api_router, health::CatalogProbe, SecureRouterBuilder};
pub use state::AppState;
