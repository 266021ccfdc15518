//! Read-only handlers over the artifact store: listing, describing,
//! downloading, and companion-file access.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use modelhub_core::dataset;
use modelhub_core::error::CoreError;
use modelhub_core::metadata::ModelMetadata;
use modelhub_core::store::{ArtifactStore, ArtifactSummary, CompanionKind};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Feature-schema discovery payload: everything a caller needs to build
/// a valid prediction request for a model.
#[derive(Debug, Serialize)]
pub struct ModelFeatures {
    pub status: &'static str,
    pub features: Vec<String>,
    pub problem_type: String,
    pub target_column: String,
}

/// GET /api/models
///
/// List all artifacts with always-current size/time fields.
pub async fn list_models(State(state): State<AppState>) -> AppResult<Json<Vec<ArtifactSummary>>> {
    let summaries = state.store.list().await?;
    Ok(Json(summaries))
}

/// GET /api/model-details/{name}
pub async fn model_details(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<ArtifactSummary>> {
    let summary = state.store.describe(&name).await?;
    Ok(Json(summary))
}

/// GET /api/download/{name}
///
/// Serve the raw artifact bytes as a file attachment.
pub async fn download_model(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Response> {
    let path = state.store.resolve_download(&name).await?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| CoreError::StorageUnavailable { source })?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// GET /api/model-csv/{name}
///
/// Serve the companion dataset verbatim as `text/csv`.
pub async fn model_csv(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Response> {
    let bytes = state
        .store
        .read_companion(&name, CompanionKind::Dataset)
        .await?;
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        bytes,
    )
        .into_response())
}

/// GET /api/csv-data/{name}
///
/// Companion dataset parsed into row objects keyed by header.
pub async fn csv_data(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<serde_json::Map<String, serde_json::Value>>>> {
    let bytes = state
        .store
        .read_companion(&name, CompanionKind::Dataset)
        .await?;
    let rows = dataset::parse_rows(&bytes)
        .map_err(|e| AppError::InternalError(format!("Dataset for '{name}' unparsable: {e}")))?;
    Ok(Json(rows))
}

/// GET /api/model-features/{name}
///
/// Feature schema recorded in the metadata sidecar. A model without a
/// sidecar is not yet discoverable here; that is a 404, not a fault.
pub async fn model_features(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<ModelFeatures>> {
    let bytes = state
        .store
        .read_companion(&name, CompanionKind::Metadata)
        .await
        .map_err(|e| match e {
            CoreError::NotFound { .. } => AppError::StatusMessage {
                status: StatusCode::NOT_FOUND,
                message: "No metadata found for this model".to_string(),
            },
            other => AppError::Core(other),
        })?;

    let metadata: ModelMetadata = serde_json::from_slice(&bytes).map_err(|e| {
        tracing::error!(model = %name, error = %e, "Metadata sidecar unparsable");
        AppError::StatusMessage {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Model metadata is corrupted".to_string(),
        }
    })?;

    Ok(Json(ModelFeatures {
        status: "success",
        features: metadata.features,
        problem_type: metadata.problem_type,
        target_column: metadata.target_column,
    }))
}
