//! Error types for the DGEN application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire DGEN application.
///
/// Variants are grouped so that callers can map them onto the categorized
/// statuses reported before a stream starts (see [`ErrorCategory`]).
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum DgenError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    /// Request failed validation (missing field, unsupported diagram type)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Caller identity missing
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Account balance cannot cover the usage cost
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    /// Caller is not allowed to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Generation service failed or returned an error status
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session was cancelled or the client went away
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Stream ended before the closing delimiter was seen
    #[error("Incomplete stream: {0}")]
    Incomplete(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse status category used when reporting an error to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Unauthorized,
    NotFound,
    Forbidden,
    BadRequest,
    Upstream,
    Internal,
}

impl ErrorCategory {
    /// HTTP-style status code for this category.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::BadRequest => 400,
            Self::Upstream => 502,
            Self::Internal => 500,
        }
    }
}

impl DgenError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.into(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an Upstream error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Classification
    // ============================================================================

    /// Maps this error onto the status category reported to callers.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized(_) => ErrorCategory::Unauthorized,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InsufficientBalance { .. } | Self::Forbidden(_) => ErrorCategory::Forbidden,
            Self::Validation(_) => ErrorCategory::BadRequest,
            Self::Upstream(_) | Self::Incomplete(_) => ErrorCategory::Upstream,
            _ => ErrorCategory::Internal,
        }
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error was caused by cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for DgenError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for DgenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for DgenError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for DgenError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, DgenError>`.
pub type Result<T> = std::result::Result<T, DgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_errors_map_to_caller_statuses() {
        assert_eq!(
            DgenError::Unauthorized("no identity".into()).category().status_code(),
            401
        );
        assert_eq!(DgenError::not_found("project", "p1").category().status_code(), 404);
        assert_eq!(
            DgenError::InsufficientBalance {
                required: 1000,
                available: 10
            }
            .category()
            .status_code(),
            403
        );
        assert_eq!(
            DgenError::validation("Unsupported diagram type: pie").category(),
            ErrorCategory::BadRequest
        );
    }

    #[test]
    fn storage_errors_are_internal() {
        assert_eq!(DgenError::data_access("disk full").category(), ErrorCategory::Internal);
        let io: DgenError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(io.category().status_code(), 500);
    }
}
