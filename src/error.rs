//! Error types for batch-relay
//!
//! This module provides error handling for the library, including:
//! - Pre-run rejections (validation, single-flight conflict)
//! - Internal run failures that still carry the partial [`RunSummary`]
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! Per-call failures are deliberately absent: a failed call is recorded as a
//! [`CallOutcome`](crate::types::CallOutcome) and never surfaces as an `Error`.

use crate::types::{RunId, RunSummary};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for batch-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for batch-relay
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input rejected before a run was started
    #[error("invalid {field}: {message}")]
    Validation {
        /// The request field that failed validation ("target", "message", "count")
        field: &'static str,
        /// Human-readable description of the problem
        message: String,
    },

    /// A run was requested while another run is active on the same dispatcher
    #[error("run {active} is already in progress")]
    Conflict {
        /// The run currently holding the single-flight slot
        active: RunId,
    },

    /// Unexpected failure inside the dispatch loop itself
    ///
    /// The run was terminated early; `partial` holds the finalized summary with
    /// every outcome collected before the failure.
    #[error("run failed: {reason}")]
    Internal {
        /// What went wrong
        reason: String,
        /// Finalized summary of the outcomes collected so far
        partial: Box<RunSummary>,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "endpoint.url")
        key: Option<String>,
    },

    /// Network error outside of an individual relay call
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Dispatcher is shutting down and not accepting new runs
    #[error("shutdown in progress: not accepting new runs")]
    ShuttingDown,
}

impl Error {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// The partial summary carried by an [`Error::Internal`], if any
    pub fn partial_summary(&self) -> Option<&RunSummary> {
        match self {
            Error::Internal { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "conflict",
///     "message": "run 3 is already in progress",
///     "details": { "active_run_id": 3 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "validation_error", "conflict")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Validation { .. } => 400,
            Error::Config { .. } => 400,
            Error::Conflict { .. } => 409,
            Error::Internal { .. } => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Network(_) => 502,
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Validation { .. } => "validation_error",
            Error::Config { .. } => "config_error",
            Error::Conflict { .. } => "conflict",
            Error::Internal { .. } => "internal_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Network(_) => "network_error",
            Error::ShuttingDown => "shutting_down",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Validation { field, .. } => Some(serde_json::json!({
                "field": field,
            })),
            Error::Conflict { active } => Some(serde_json::json!({
                "active_run_id": active,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Internal { partial, .. } => Some(serde_json::json!({
                "run_id": partial.run_id,
                "attempted": partial.attempted,
                "sent": partial.sent,
                "failed": partial.failed,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
