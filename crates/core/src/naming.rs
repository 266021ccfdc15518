//! Artifact naming conventions.
//!
//! Generates collision-resistant artifact names and derives companion
//! (sidecar) paths by extension substitution. Companions share the
//! artifact's stem: `1712_ab12cd34_model.pkl` sits next to
//! `1712_ab12cd34_model.csv` (dataset) and `1712_ab12cd34_model.json`
//! (metadata).

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::error::CoreError;

/// File extension of a trained model artifact (without the dot).
pub const MODEL_EXTENSION: &str = "pkl";

/// File extension of the companion dataset (without the dot).
pub const DATASET_EXTENSION: &str = "csv";

/// File extension of the companion metadata sidecar (without the dot).
pub const METADATA_EXTENSION: &str = "json";

/// Maximum length of an artifact name.
const MAX_NAME_LEN: usize = 255;

/// Generate a fresh artifact filename.
///
/// Convention: `{unix_millis}_{8-hex-suffix}_model.pkl`. The timestamp
/// keeps names sortable by creation time; the random suffix makes
/// concurrent training requests collision-resistant.
pub fn generate_artifact_name() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    format!("{millis}_{suffix}_model.{MODEL_EXTENSION}")
}

/// Derive a companion path by swapping the extension of `artifact_path`.
pub fn companion_path(artifact_path: &Path, extension: &str) -> PathBuf {
    artifact_path.with_extension(extension)
}

/// Validate a client-supplied artifact name.
///
/// Rules:
/// - Must not be empty or exceed `MAX_NAME_LEN` characters.
/// - Must contain only alphanumeric, hyphen, underscore, or dot characters.
/// - Must not start with a dot.
///
/// Names arrive from URL path segments, so this is the only guard
/// between a request and a filesystem lookup.
pub fn validate_artifact_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Artifact name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Artifact name must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    if name.starts_with('.') {
        return Err(CoreError::Validation(
            "Artifact name must not start with a dot".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(
            "Artifact name may only contain alphanumeric, hyphen, underscore, or dot characters"
                .to_string(),
        ));
    }
    Ok(())
}
