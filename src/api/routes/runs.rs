//! Run handlers.

use super::{CancelRunResponse, CurrentRunResponse, StartRunRequest, StartRunResponse};
use crate::api::AppState;
use crate::error::ApiError;
use crate::types::DispatchRequest;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /runs - Start a run
///
/// Validates the request, claims the dispatcher and drives the run on a
/// background task. Progress is reported through `GET /events`.
#[utoipa::path(
    post,
    path = "/api/v1/runs",
    tag = "runs",
    request_body(content = StartRunRequest, description = "Target, message, count and pacing"),
    responses(
        (status = 202, description = "Run started", body = StartRunResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 409, description = "Another run is active", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_run(
    State(state): State<AppState>,
    Json(body): Json<StartRunRequest>,
) -> Response {
    let delay_ms = body.resolve_delay_ms(state.config.dispatch.default_delay_ms);

    let request = match DispatchRequest::new(&body.target, &body.message, body.count, delay_ms) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    let run = match state.dispatcher.begin(request) {
        Ok(run) => run,
        Err(e) => return e.into_response(),
    };

    let run_id = run.handle().id();
    tokio::spawn(async move {
        if let Err(e) = run.execute(()).await {
            tracing::warn!(run_id = %run_id, error = %e, "background run ended with error");
        }
    });

    (StatusCode::ACCEPTED, Json(StartRunResponse { run_id })).into_response()
}

/// GET /runs/current - Active run, if any
#[utoipa::path(
    get,
    path = "/api/v1/runs/current",
    tag = "runs",
    responses(
        (status = 200, description = "Whether a run is active", body = CurrentRunResponse)
    )
)]
pub async fn current_run(State(state): State<AppState>) -> impl IntoResponse {
    let run_id = state.dispatcher.active_run().map(|handle| handle.id());

    Json(CurrentRunResponse {
        running: run_id.is_some(),
        run_id,
    })
}

/// DELETE /runs/current - Cancel the active run
///
/// Idempotent; `cancelled` is false when nothing was running or the run was
/// already signalled.
#[utoipa::path(
    delete,
    path = "/api/v1/runs/current",
    tag = "runs",
    responses(
        (status = 200, description = "Cancellation result", body = CancelRunResponse)
    )
)]
pub async fn cancel_run(State(state): State<AppState>) -> impl IntoResponse {
    let cancelled = state.dispatcher.cancel_active();
    Json(CancelRunResponse { cancelled })
}

/// GET /runs/last - Summary of the most recently finished run
#[utoipa::path(
    get,
    path = "/api/v1/runs/last",
    tag = "runs",
    responses(
        (status = 200, description = "Last run summary", body = crate::types::RunSummary),
        (status = 404, description = "No run has finished yet", body = crate::error::ApiError)
    )
)]
pub async fn last_run(State(state): State<AppState>) -> Response {
    match state.dispatcher.last_summary() {
        Some(summary) => (StatusCode::OK, Json(summary)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found("finished run")),
        )
            .into_response(),
    }
}
