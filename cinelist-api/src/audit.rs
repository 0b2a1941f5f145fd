//! Security Audit Log
//!
//! Every catalog procedure writes one record per call, success or failure.
//! Records render as a single line:
//!
//! ```text
//! [2024-01-01T00:00:00.000Z] [ERROR] [SECURITY] | User: 42 | Action: movies.getOne | Resource: movie/7 | Status: failure | Error: Movie not found
//! ```
//!
//! Absent parts (IP, error, details) are left out of the line entirely.
//! Where records go is decided by an [`AuditSink`]: the default sink writes
//! through `tracing` with target `security`, tests capture them in memory.

use chrono::{SecondsFormat, Utc};
use cinelist_core::Timestamp;
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::telemetry::metrics;

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Failure => "failure",
        }
    }

    /// Failures are logged at error level, everything else at info.
    pub fn level(&self) -> AuditLevel {
        match self {
            AuditStatus::Success => AuditLevel::Info,
            AuditStatus::Failure => AuditLevel::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Error,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Info => "INFO",
            AuditLevel::Error => "ERROR",
        }
    }
}

/// One security log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityEvent {
    pub timestamp: Timestamp,
    /// `None` renders as "Anonymous".
    pub user_id: Option<String>,
    pub action: String,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub status: AuditStatus,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub error: Option<String>,
}

impl SecurityEvent {
    pub fn new(action: impl Into<String>, status: AuditStatus) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: None,
            action: action.into(),
            resource: None,
            resource_id: None,
            status,
            details: None,
            ip_address: None,
            error: None,
        }
    }

    pub fn success(action: impl Into<String>) -> Self {
        Self::new(action, AuditStatus::Success)
    }

    pub fn failure(action: impl Into<String>) -> Self {
        Self::new(action, AuditStatus::Failure)
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>, id: Option<String>) -> Self {
        self.resource = Some(resource.into());
        self.resource_id = id;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn level(&self) -> AuditLevel {
        self.status.level()
    }

    /// Render the single-line record.
    pub fn format_line(&self) -> String {
        let user = match &self.user_id {
            Some(id) => format!("User: {}", id),
            None => "User: Anonymous".to_string(),
        };
        let resource = match (&self.resource, &self.resource_id) {
            (Some(r), Some(id)) => format!("{}/{}", r, id),
            (Some(r), None) => r.clone(),
            (None, _) => "N/A".to_string(),
        };

        let mut parts = vec![
            format!(
                "[{}] [{}] [SECURITY]",
                self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                self.level().as_str()
            ),
            user,
            format!("Action: {}", self.action),
            format!("Resource: {}", resource),
            format!("Status: {}", self.status.as_str()),
        ];
        if let Some(ip) = &self.ip_address {
            parts.push(format!("IP: {}", ip));
        }
        if let Some(error) = &self.error {
            parts.push(format!("Error: {}", error));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        parts.join(" | ")
    }
}

// ============================================================================
// SINKS
// ============================================================================

/// Destination of security records.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &SecurityEvent);
}

/// Writes each record through `tracing` with target `security`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &SecurityEvent) {
        let line = event.format_line();
        match event.level() {
            AuditLevel::Error => tracing::error!(
                target: "security",
                action = %event.action,
                status = event.status.as_str(),
                "{}",
                line
            ),
            AuditLevel::Info => tracing::info!(
                target: "security",
                action = %event.action,
                status = event.status.as_str(),
                "{}",
                line
            ),
        }
    }
}

/// Keeps records in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<SecurityEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &SecurityEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

// ============================================================================
// LOGGER
// ============================================================================

/// Front door for security records.
#[derive(Clone)]
pub struct SecurityLogger {
    sink: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for SecurityLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityLogger").finish_non_exhaustive()
    }
}

impl Default for SecurityLogger {
    fn default() -> Self {
        Self::new(Arc::new(TracingAuditSink))
    }
}

impl SecurityLogger {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn log(&self, event: SecurityEvent) {
        if let Some(metrics) = metrics() {
            metrics.record_security_event(&event.action, event.status.as_str());
        }
        self.sink.record(&event);
    }
}
