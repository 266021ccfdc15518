pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// GET  /models                    list artifact summaries
/// GET  /model-details/{name}      single artifact summary
/// GET  /download/{name}           raw artifact bytes (attachment)
/// GET  /model-csv/{name}          companion dataset as text/csv
/// GET  /csv-data/{name}           companion dataset as row objects
/// GET  /model-features/{name}     feature schema from the sidecar
/// POST /train                     multipart dataset upload -> artifact
/// POST /predict/{name}            feature payload -> prediction
/// GET  /generate-graph/{name}     chart parameters -> base64 image
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/models", get(handlers::models::list_models))
        .route("/model-details/{name}", get(handlers::models::model_details))
        .route("/download/{name}", get(handlers::models::download_model))
        .route("/model-csv/{name}", get(handlers::models::model_csv))
        .route("/csv-data/{name}", get(handlers::models::csv_data))
        .route("/model-features/{name}", get(handlers::models::model_features))
        .route("/train", post(handlers::training::train_model))
        .route("/predict/{name}", post(handlers::prediction::predict))
        .route("/generate-graph/{name}", get(handlers::charts::generate_graph))
}
