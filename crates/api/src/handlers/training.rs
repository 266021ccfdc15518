//! Training orchestrator: one uploaded dataset in, one artifact out.
//!
//! Request lifecycle: Received (multipart validated) -> Staged (upload
//! persisted, output name generated) -> Invoking (gateway train mode)
//! -> Succeeded (sidecar lifted, artifact registered) or Failed (both
//! streams forwarded). The staged upload is deleted on every exit path.

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use modelhub_core::error::CoreError;
use modelhub_core::metadata::ModelMetadata;
use modelhub_core::naming::generate_artifact_name;
use modelhub_core::store::CompanionKind;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Target selector value meaning "let the worker infer the target".
const TARGET_AUTOMATIC: &str = "automatic";

/// Successful training response.
#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub message: &'static str,
    #[serde(rename = "modelPath")]
    pub model_path: String,
    /// Raw worker stdout (training progress log).
    pub output: String,
    /// Problem-type-dependent metric values from the sidecar.
    pub metrics: serde_json::Value,
    #[serde(rename = "problemType")]
    pub problem_type: String,
}

/// POST /api/train
///
/// Multipart form with a required `file` field (the dataset) and an
/// optional `targetColumn` field forwarded opaquely to the worker.
pub async fn train_model(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<TrainResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut target: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("dataset.csv").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                upload = Some((filename, data.to_vec()));
            }
            "targetColumn" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                target = Some(text);
            }
            _ => {} // ignore unknown fields
        }
    }

    // Received: absence of a file is a client error, no worker is spawned.
    let (original_filename, data) = upload.ok_or(AppError::MissingUpload)?;

    // "automatic" (or blank) means the worker picks the target itself.
    let target = target.filter(|t| !t.trim().is_empty() && t != TARGET_AUTOMATIC);

    // Staged: persist the upload under a unique name.
    let staged = state
        .config
        .uploads_dir
        .join(format!("upload_{}.csv", Uuid::new_v4().simple()));
    tokio::fs::write(&staged, &data)
        .await
        .map_err(|source| CoreError::StorageUnavailable { source })?;

    let created_at = Utc::now();
    tracing::info!(
        file = %original_filename,
        bytes = data.len(),
        target = target.as_deref().unwrap_or(TARGET_AUTOMATIC),
        "Training request staged"
    );

    let result = run_training(
        &state,
        &staged,
        &data,
        &original_filename,
        target.as_deref(),
        created_at,
    )
    .await;

    // Guaranteed cleanup of the staged upload, success or failure.
    if let Err(e) = tokio::fs::remove_file(&staged).await {
        tracing::warn!(path = %staged.display(), error = %e, "Failed to remove staged upload");
    }

    result.map(Json)
}

/// Invoking -> Succeeded/Failed: run the worker and, on success,
/// register the artifact (dataset copy + merged metadata sidecar).
async fn run_training(
    state: &AppState,
    staged: &std::path::Path,
    dataset_bytes: &[u8],
    original_filename: &str,
    target: Option<&str>,
    created_at: chrono::DateTime<Utc>,
) -> AppResult<TrainResponse> {
    let artifact_name = generate_artifact_name();
    let output_path = state.store.artifact_path(&artifact_name)?;

    let report = state
        .gateway
        .train(staged, &output_path, target)
        .await
        .map_err(AppError::Training)?;

    // Register the companion dataset so charting and CSV views work.
    state
        .store
        .write_companion(&artifact_name, CompanionKind::Dataset, dataset_bytes)
        .await?;

    // Merge the worker's sidecar with what only we know, and rewrite it.
    let metadata = ModelMetadata::from_sidecar(
        report.sidecar,
        original_filename.to_string(),
        created_at,
        report.output.stdout.clone(),
    );
    let metadata_bytes = serde_json::to_vec_pretty(&metadata)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize metadata: {e}")))?;
    state
        .store
        .write_companion(&artifact_name, CompanionKind::Metadata, &metadata_bytes)
        .await?;

    tracing::info!(artifact = %artifact_name, "Model trained and registered");

    Ok(TrainResponse {
        message: "Model trained successfully",
        model_path: output_path.display().to_string(),
        output: report.output.stdout,
        metrics: metadata.metrics,
        problem_type: metadata.problem_type,
    })
}
