//! Chart orchestrator: render one chart from an artifact's companion
//! dataset. Nothing is persisted; the image is a pure function of its
//! inputs, so identical requests are idempotent from the caller's view.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use modelhub_core::store::CompanionKind;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Query parameters for chart generation. All three are required; the
/// orchestrator rejects incomplete requests instead of forwarding them.
#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    #[serde(rename = "graphType")]
    pub graph_type: Option<String>,
    #[serde(rename = "xColumn")]
    pub x_column: Option<String>,
    #[serde(rename = "yColumn")]
    pub y_column: Option<String>,
}

/// GET /api/generate-graph/{name}?graphType&xColumn&yColumn
pub async fn generate_graph(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let (Some(graph_type), Some(x_column), Some(y_column)) =
        (query.graph_type, query.x_column, query.y_column)
    else {
        return Err(AppError::MissingChartParams);
    };

    // Resolve the companion dataset path; existence is the worker's
    // problem to report.
    let dataset_path = state.store.companion_path(&name, CompanionKind::Dataset)?;

    let chart = state
        .gateway
        .chart(&dataset_path, &graph_type, &x_column, &y_column)
        .await
        .map_err(AppError::Chart)?;

    tracing::info!(artifact = %name, kind = %graph_type, "Chart rendered");

    Ok(Json(json!({
        "status": "success",
        "image": chart.image,
    })))
}
