//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the batch-relay REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the batch-relay REST API
///
/// The spec can be accessed via:
/// - `/api/v1/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "batch-relay REST API",
        version = "0.1.0",
        description = "Start, observe and cancel sequential batch runs against a relay endpoint",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790/api/v1", description = "Local development server")
    ),
    paths(
        // Runs
        crate::api::routes::start_run,
        crate::api::routes::current_run,
        crate::api::routes::cancel_run,
        crate::api::routes::last_run,

        // System
        crate::api::routes::probe,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::RunId,
        crate::types::RunState,
        crate::types::DelayMode,
        crate::types::CallOutcome,
        crate::types::RunSummary,
        crate::types::ConnectivityResult,
        crate::types::Event,

        // Config types from config.rs
        crate::config::Config,
        crate::config::EndpointConfig,
        crate::config::DispatchConfig,
        crate::config::ApiConfig,

        // API request/response types
        crate::api::routes::StartRunRequest,
        crate::api::routes::StartRunResponse,
        crate::api::routes::CurrentRunResponse,
        crate::api::routes::CancelRunResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "runs", description = "Runs - Start, inspect and cancel batch runs"),
        (name = "system", description = "System endpoints - Health, relay probe, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_has_run_paths() {
        let spec = ApiDoc::openapi();

        assert!(spec.paths.paths.contains_key("/api/v1/runs"));
        assert!(spec.paths.paths.contains_key("/api/v1/runs/current"));
        assert!(spec.paths.paths.contains_key("/api/v1/probe"));
    }

    #[test]
    fn test_openapi_spec_has_components() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components should be defined");

        assert!(components.schemas.contains_key("RunSummary"));
        assert!(components.schemas.contains_key("ApiError"));
    }

    #[test]
    fn test_openapi_spec_serializes() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("batch-relay REST API"));
    }
}
