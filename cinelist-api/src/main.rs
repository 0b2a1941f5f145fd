//! Cinelist API Server Entry Point
//!
//! Reads configuration from the environment, picks the catalog backend and
//! starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use cinelist_api::telemetry::{init_tracing, TelemetryConfig};
use cinelist_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, CatalogBackend,
    CatalogProbe, DbClient, DbConfig, ItemsConfig, SecurityLogger,
};
use cinelist_storage::{sample_catalog, CatalogStore, SessionLookup};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let backend = CatalogBackend::from_env()?;
    let (catalog, sessions, probe) = match backend {
        CatalogBackend::Postgres => {
            let db = DbClient::from_config(&DbConfig::from_env())?;
            let catalog: Arc<dyn CatalogStore> = Arc::new(db.clone());
            let sessions: Arc<dyn SessionLookup> = Arc::new(db.clone());
            (catalog, sessions, CatalogProbe::Postgres(db))
        }
        CatalogBackend::Memory => {
            tracing::warn!("Using the seeded in-memory catalog");
            let shared = Arc::new(sample_catalog()?);
            let catalog: Arc<dyn CatalogStore> = shared.clone();
            let sessions: Arc<dyn SessionLookup> = shared;
            (catalog, sessions, CatalogProbe::Memory)
        }
    };

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();
    let items_config = ItemsConfig::from_env();

    let state = AppState::new(&items_config, catalog, probe, SecurityLogger::default());
    let app = create_api_router(state, &api_config, auth_config, sessions)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, backend = ?backend, "Starting Cinelist API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("CINELIST_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("CINELIST_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
