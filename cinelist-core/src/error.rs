//! Error types for Cinelist operations

use crate::EntityType;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{} with id {id} not found", entity_type.display_name())]
    NotFound { entity_type: EntityType, id: String },

    /// Deliberate failure raised by the fault injection hook.
    #[error("{reason}")]
    SimulatedFault { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Serialization failed for {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Backend error: {reason}")]
    Backend { reason: String },
}

impl StorageError {
    /// Create a NotFound error for the given entity.
    pub fn not_found(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create a Backend error from anything printable.
    pub fn backend(reason: impl ToString) -> Self {
        Self::Backend {
            reason: reason.to_string(),
        }
    }

    /// Returns true if this error means the row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unknown comment target type: {value}")]
    UnknownCommentTarget { value: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Cinelist errors.
#[derive(Debug, Clone, Error)]
pub enum CinelistError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Cinelist operations.
pub type CinelistResult<T> = Result<T, CinelistError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// TESTS
// =============================================================================
