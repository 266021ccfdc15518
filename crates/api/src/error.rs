use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use modelhub_core::error::CoreError;
use modelhub_core::worker::WorkerError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for store/validation errors and [`WorkerError`]
/// per orchestration, because each orchestrator owes its clients a
/// different error body: training failures carry `output`/`errorOutput`,
/// prediction and chart failures use the `{status, message, details}`
/// shape. Implements [`IntoResponse`] so handlers stay declarative.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `modelhub-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A worker error raised while training a model.
    #[error("Training failed: {0}")]
    Training(WorkerError),

    /// A worker error raised while producing a prediction.
    #[error("Prediction failed: {0}")]
    Prediction(WorkerError),

    /// A worker error raised while rendering a chart.
    #[error("Chart generation failed: {0}")]
    Chart(WorkerError),

    /// A not-found (or similar) condition on the prediction surface,
    /// which reports errors as `{"status":"error","message":…}`.
    #[error("{message}")]
    StatusMessage {
        status: StatusCode,
        message: String,
    },

    /// `POST /train` without an attached file.
    #[error("No file uploaded.")]
    MissingUpload,

    /// `GET /generate-graph` with a missing required query parameter.
    #[error("Missing required parameters")]
    MissingChartParams,

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, name } => (
                    StatusCode::NOT_FOUND,
                    json!({
                        "error": format!("{entity} '{name}' not found"),
                        "code": "NOT_FOUND",
                    }),
                ),
                CoreError::Validation(msg) => (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": msg, "code": "VALIDATION_ERROR" }),
                ),
                CoreError::StorageUnavailable { source } => {
                    tracing::error!(error = %source, "Artifact storage unavailable");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({
                            "error": "Error reading models directory",
                            "code": "STORAGE_UNAVAILABLE",
                        }),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({
                            "error": "An internal error occurred",
                            "code": "INTERNAL_ERROR",
                        }),
                    )
                }
            },

            // --- Training: `{error, output, errorOutput}` bodies ---
            AppError::Training(err) => training_body(err),

            // --- Prediction / chart: `{status, message, details}` bodies ---
            AppError::Prediction(err) => worker_status_body("Prediction", err),
            AppError::Chart(err) => worker_status_body("Chart generation", err),

            AppError::StatusMessage { status, message } => {
                (status, json!({ "status": "error", "message": message }))
            }

            AppError::MissingUpload => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "No file uploaded." }),
            ),

            AppError::MissingChartParams => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Missing required parameters" }),
            ),

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "code": "BAD_REQUEST" }),
            ),

            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "An internal error occurred",
                        "code": "INTERNAL_ERROR",
                    }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Map a training worker error onto the `{error, output, errorOutput}`
/// body the training surface promises, preserving both streams so the
/// caller can tell "your data was malformed" from "the service is broken".
fn training_body(err: WorkerError) -> (StatusCode, serde_json::Value) {
    match err {
        WorkerError::Failed {
            exit_code,
            stdout,
            stderr,
        } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": "Error training model",
                "exitCode": exit_code,
                "output": stdout,
                "errorOutput": stderr,
            }),
        ),
        WorkerError::ContractViolation { reason, stdout } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": format!("Training worker violated its output contract: {reason}"),
                "output": stdout,
                "errorOutput": "",
            }),
        ),
        WorkerError::Timeout {
            elapsed_ms,
            stdout,
            stderr,
        } => (
            StatusCode::GATEWAY_TIMEOUT,
            json!({
                "error": format!("Training worker timed out after {elapsed_ms}ms"),
                "output": stdout,
                "errorOutput": stderr,
            }),
        ),
        WorkerError::Launch { source } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": format!("Training worker could not be started: {source}"),
                "output": "",
                "errorOutput": "",
            }),
        ),
        WorkerError::CapacityExceeded => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": "Worker capacity exceeded, try again later" }),
        ),
        WorkerError::Io(e) => {
            tracing::error!(error = %e, "I/O error during training invocation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Error training model",
                    "output": "",
                    "errorOutput": e.to_string(),
                }),
            )
        }
    }
}

/// Map a predict/chart worker error onto the `{status, message, details}`
/// body, keeping worker failures and contract violations distinguishable.
fn worker_status_body(operation: &str, err: WorkerError) -> (StatusCode, serde_json::Value) {
    match err {
        WorkerError::Failed { stderr, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "status": "error",
                "message": format!("{operation} failed"),
                "details": stderr,
            }),
        ),
        WorkerError::ContractViolation { reason, stdout } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "status": "error",
                "message": format!("{operation} worker returned invalid output: {reason}"),
                "details": stdout,
            }),
        ),
        WorkerError::Timeout {
            elapsed_ms, stderr, ..
        } => (
            StatusCode::GATEWAY_TIMEOUT,
            json!({
                "status": "error",
                "message": format!("{operation} worker timed out after {elapsed_ms}ms"),
                "details": stderr,
            }),
        ),
        WorkerError::Launch { source } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "status": "error",
                "message": format!("{operation} worker could not be started"),
                "details": source.to_string(),
            }),
        ),
        WorkerError::CapacityExceeded => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "status": "error",
                "message": "Worker capacity exceeded, try again later",
            }),
        ),
        WorkerError::Io(e) => {
            tracing::error!(error = %e, "I/O error during worker invocation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "status": "error",
                    "message": format!("{operation} failed"),
                    "details": e.to_string(),
                }),
            )
        }
    }
}
