//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`runs`] - Start, inspect and cancel runs
//! - [`system`] - Health, relay probe, events, OpenAPI

use crate::types::{DelayMode, RunId};
use serde::{Deserialize, Serialize};

mod runs;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use runs::*;
pub use system::*;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /runs
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StartRunRequest {
    /// Target link the message is delivered to
    pub target: String,
    /// Message text (1..=500 characters after trimming)
    pub message: String,
    /// Number of calls (1..=1000)
    pub count: u32,
    /// Delay between calls in milliseconds (takes precedence over `mode`)
    #[serde(default)]
    pub delay_ms: Option<u64>,
    /// Named delay preset, used when `delay_ms` is absent
    #[serde(default)]
    pub mode: Option<DelayMode>,
}

impl StartRunRequest {
    /// Delay to use, falling back to the configured default
    pub fn resolve_delay_ms(&self, default_delay_ms: u64) -> u64 {
        self.delay_ms
            .or(self.mode.map(|mode| mode.as_millis()))
            .unwrap_or(default_delay_ms)
    }
}

/// Response body for POST /runs
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StartRunResponse {
    /// ID of the run that was started
    pub run_id: RunId,
}

/// Response body for GET /runs/current
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CurrentRunResponse {
    /// Whether a run holds the dispatcher
    pub running: bool,
    /// ID of the active run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
}

/// Response body for DELETE /runs/current
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CancelRunResponse {
    /// Whether an active run was newly signalled
    pub cancelled: bool,
}
