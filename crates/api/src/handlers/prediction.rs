//! Inference orchestrator: one artifact plus one feature payload.
//!
//! Fails fast on a missing model or missing metadata before any worker
//! is spawned. The staged input file is removed unconditionally once
//! the worker has finished, on both success and failure paths.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use modelhub_core::error::CoreError;
use modelhub_core::store::{ArtifactStore, CompanionKind};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/predict/{name}
///
/// Body: a feature-name-to-value JSON object. Keys are matched by name
/// downstream, so key order never changes the invocation.
pub async fn predict(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<serde_json::Map<String, serde_json::Value>>,
) -> AppResult<Json<serde_json::Value>> {
    // Fail fast: unknown artifact, before staging anything.
    let model_path = match state.store.resolve_download(&name).await {
        Ok(path) => path,
        Err(CoreError::NotFound { .. }) => {
            return Err(AppError::StatusMessage {
                status: StatusCode::NOT_FOUND,
                message: "Model file not found".to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    // A model without its metadata sidecar is not yet predictable.
    if !state
        .store
        .companion_exists(&name, CompanionKind::Metadata)
        .await?
    {
        return Err(AppError::StatusMessage {
            status: StatusCode::NOT_FOUND,
            message: "No metadata found for this model".to_string(),
        });
    }

    // Stage the feature payload to a uniquely named temporary file.
    let staged = state
        .config
        .staging_dir
        .join(format!("predict_{}.json", Uuid::new_v4().simple()));
    let body = serde_json::to_vec(&payload)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize payload: {e}")))?;
    tokio::fs::write(&staged, &body)
        .await
        .map_err(|source| CoreError::StorageUnavailable { source })?;

    let result = state.gateway.predict(&model_path, &staged).await;

    // Guaranteed cleanup regardless of the worker's outcome.
    if let Err(e) = tokio::fs::remove_file(&staged).await {
        tracing::warn!(path = %staged.display(), error = %e, "Failed to remove staged prediction input");
    }

    let prediction = result.map_err(AppError::Prediction)?;
    tracing::info!(artifact = %name, "Prediction produced");

    Ok(Json(json!({
        "status": "success",
        "prediction": prediction.value,
    })))
}
