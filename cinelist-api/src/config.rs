//! API Configuration Module
//!
//! CORS, item store timing and catalog backend selection. Configuration is
//! loaded from environment variables with sensible defaults for development.

use std::str::FromStr;
use std::time::Duration;

use cinelist_core::ConfigError;

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_millis(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_parse(name).unwrap_or(default_ms))
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP surface configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    /// Example: "https://cinelist.app,https://admin.cinelist.app"
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// - `CINELIST_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `CINELIST_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `CINELIST_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("CINELIST_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("CINELIST_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs: env_parse("CINELIST_CORS_MAX_AGE_SECS").unwrap_or(86400),
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.cinelist.app
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

// ============================================================================
// ITEM LIST CONFIGURATION
// ============================================================================

/// Simulated latencies of the item list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemsConfig {
    /// Delay of every item store operation.
    pub store_latency: Duration,
    /// Delay of the select acknowledgment.
    pub select_latency: Duration,
}

impl Default for ItemsConfig {
    fn default() -> Self {
        Self {
            store_latency: Duration::from_millis(200),
            select_latency: Duration::from_millis(1000),
        }
    }
}

impl ItemsConfig {
    /// - `CINELIST_STORE_LATENCY_MS` (default: 200)
    /// - `CINELIST_SELECT_LATENCY_MS` (default: 1000)
    pub fn from_env() -> Self {
        Self {
            store_latency: env_millis("CINELIST_STORE_LATENCY_MS", 200),
            select_latency: env_millis("CINELIST_SELECT_LATENCY_MS", 1000),
        }
    }

    /// No artificial delays. Used by tests.
    pub fn instant() -> Self {
        Self {
            store_latency: Duration::ZERO,
            select_latency: Duration::ZERO,
        }
    }
}

// ============================================================================
// CATALOG BACKEND
// ============================================================================

/// Where catalog reads and session lookups go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogBackend {
    /// PostgreSQL through the connection pool.
    #[default]
    Postgres,
    /// Seeded in-process catalog, for local development.
    Memory,
}

impl FromStr for CatalogBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                field: "CINELIST_CATALOG_BACKEND".to_string(),
                value: other.to_string(),
                reason: "expected postgres or memory".to_string(),
            }),
        }
    }
}

impl CatalogBackend {
    /// Read `CINELIST_CATALOG_BACKEND`, defaulting to postgres when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("CINELIST_CATALOG_BACKEND") {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }
}
