//! Trained-model metadata records.
//!
//! Two shapes exist for the same sidecar file. [`TrainingSidecar`] is
//! the minimal document the training worker is contractually required
//! to write next to the model. After a successful run the orchestrator
//! merges in what only it knows (original filename, captured stdout,
//! timestamps) and rewrites the sidecar as a full [`ModelMetadata`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The sidecar document the training worker must produce.
///
/// `features` ordering matters downstream: prediction payloads are
/// keyed by name, but the worker reconstructs its frame in this order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSidecar {
    /// Ordered feature column names, excluding the target.
    pub features: Vec<String>,
    /// The column the model was trained to predict.
    pub target_column: String,
    /// Opaque problem classification, e.g. `"classification"` or
    /// `"regression"`. Recorded by the worker, never interpreted here.
    pub problem_type: String,
    /// Problem-type-dependent metric values (accuracy, MSE, R², ...).
    /// Kept as raw JSON since the shape varies by problem type.
    pub metrics: serde_json::Value,
}

/// The full metadata record for a registered artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Filename of the dataset as originally uploaded by the client.
    pub original_filename: String,
    /// When the training request was accepted.
    pub created_at: DateTime<Utc>,
    /// Ordered feature column names, excluding the target.
    pub features: Vec<String>,
    /// The column the model was trained to predict.
    pub target_column: String,
    /// Opaque problem classification recorded by the worker.
    pub problem_type: String,
    /// Problem-type-dependent metric values.
    pub metrics: serde_json::Value,
    /// Raw worker stdout captured during training.
    pub training_output: String,
    /// When the training run finished.
    pub completed_at: DateTime<Utc>,
}

impl ModelMetadata {
    /// Combine the worker-written sidecar with orchestrator-known fields.
    pub fn from_sidecar(
        sidecar: TrainingSidecar,
        original_filename: String,
        created_at: DateTime<Utc>,
        training_output: String,
    ) -> Self {
        Self {
            original_filename,
            created_at,
            features: sidecar.features,
            target_column: sidecar.target_column,
            problem_type: sidecar.problem_type,
            metrics: sidecar.metrics,
            training_output,
            completed_at: Utc::now(),
        }
    }
}
