//! Prometheus Metrics Definitions
//!
//! Defines all Cinelist metrics with their labels and exposes a /metrics
//! endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds). The item routes sleep for
/// 200ms or 1s on purpose, so the upper buckets matter.
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Database operation latency buckets (seconds)
const DB_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0];

/// Global metrics instance - initialized once on first use
pub static METRICS: Lazy<ApiResult<CinelistMetrics>> = Lazy::new(CinelistMetrics::new);

/// Registered metrics, or `None` when registration failed.
///
/// Registration failure is logged once and recording becomes a no-op.
pub fn metrics() -> Option<&'static CinelistMetrics> {
    static REPORTED: std::sync::Once = std::sync::Once::new();
    match METRICS.as_ref() {
        Ok(m) => Some(m),
        Err(e) => {
            REPORTED.call_once(|| tracing::error!(error = %e, "Metrics unavailable"));
            None
        }
    }
}

fn registration_error(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

/// Container for all Cinelist metrics.
#[derive(Clone)]
pub struct CinelistMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Catalog database operations - labels: operation, entity, status
    pub db_operations_total: CounterVec,

    /// Catalog database duration - labels: operation, entity
    pub db_operation_duration_seconds: HistogramVec,

    /// Cached item reads - labels: key, result (hit/miss)
    pub cache_lookups_total: CounterVec,

    /// Tag invalidations - labels: tag
    pub cache_invalidations_total: CounterVec,

    /// Item mutations - labels: action, outcome
    pub item_mutations_total: CounterVec,

    /// Security audit records - labels: action, status
    pub security_events_total: CounterVec,
}

impl CinelistMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "cinelist_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "cinelist_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            db_operations_total: register_counter_vec!(
                "cinelist_db_operations_total",
                "Total number of catalog database operations",
                &["operation", "entity", "status"]
            )
            .map_err(|e| registration_error("db_operations_total", e))?,

            db_operation_duration_seconds: register_histogram_vec!(
                "cinelist_db_operation_duration_seconds",
                "Catalog database operation duration in seconds",
                &["operation", "entity"],
                DB_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("db_operation_duration_seconds", e))?,

            cache_lookups_total: register_counter_vec!(
                "cinelist_cache_lookups_total",
                "Cached item reads by key and result",
                &["key", "result"]
            )
            .map_err(|e| registration_error("cache_lookups_total", e))?,

            cache_invalidations_total: register_counter_vec!(
                "cinelist_cache_invalidations_total",
                "Cache tag invalidations",
                &["tag"]
            )
            .map_err(|e| registration_error("cache_invalidations_total", e))?,

            item_mutations_total: register_counter_vec!(
                "cinelist_item_mutations_total",
                "Item actions by outcome",
                &["action", "outcome"]
            )
            .map_err(|e| registration_error("item_mutations_total", e))?,

            security_events_total: register_counter_vec!(
                "cinelist_security_events_total",
                "Security audit records by action and status",
                &["action", "status"]
            )
            .map_err(|e| registration_error("security_events_total", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a database operation.
    pub fn record_db_operation(
        &self,
        operation: &str,
        entity: &str,
        success: bool,
        duration_secs: f64,
    ) {
        let status = if success { "success" } else { "error" };
        self.db_operations_total
            .with_label_values(&[operation, entity, status])
            .inc();
        self.db_operation_duration_seconds
            .with_label_values(&[operation, entity])
            .observe(duration_secs);
    }

    pub fn record_cache_lookup(&self, key: &str, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.cache_lookups_total
            .with_label_values(&[key, result])
            .inc();
    }

    pub fn record_invalidation(&self, tag: &str) {
        self.cache_invalidations_total.with_label_values(&[tag]).inc();
    }

    pub fn record_item_mutation(&self, action: &str, success: bool) {
        let outcome = if success { "success" } else { "error" };
        self.item_mutations_total
            .with_label_values(&[action, outcome])
            .inc();
    }

    pub fn record_security_event(&self, action: &str, status: &str) {
        self.security_events_total
            .with_label_values(&[action, status])
            .inc();
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/metrics",
    tag = "Metrics",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
))]
pub async fn metrics_handler() -> impl IntoResponse {
    // Touch the registry so an idle server still exports every family.
    let _ = metrics();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_cache_lookup_counts_by_result() -> Result<(), String> {
        let metrics = metrics().ok_or("metrics unavailable")?;
        let before = metrics
            .cache_lookups_total
            .with_label_values(&["test-key", "hit"])
            .get();
        metrics.record_cache_lookup("test-key", true);
        metrics.record_cache_lookup("test-key", false);
        let after = metrics
            .cache_lookups_total
            .with_label_values(&["test-key", "hit"])
            .get();
        assert_eq!(after - before, 1.0);
        Ok(())
    }

    #[test]
    fn test_record_mutation_and_security_event() -> Result<(), String> {
        let metrics = metrics().ok_or("metrics unavailable")?;
        metrics.record_item_mutation("add", true);
        metrics.record_item_mutation("edit", false);
        metrics.record_security_event("movies.getOne", "failure");
        metrics.record_db_operation("get", "movie", true, 0.005);
        Ok(())
    }

    #[tokio::test]
    async fn test_metrics_handler_exports_families() {
        let response = metrics_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
