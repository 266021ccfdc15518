//! Filesystem-backed artifact store.
//!
//! One directory holds every registered artifact: the model payload
//! plus optional same-stem dataset and metadata companions. Only files
//! with the model extension count as artifacts when listing, so
//! companions never masquerade as models.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::naming::{companion_path, validate_artifact_name, MODEL_EXTENSION};

use super::{ArtifactStore, ArtifactSummary, CompanionKind};

/// Artifact store rooted at a single directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    /// Directory containing model payloads and their companions.
    models_dir: PathBuf,
    /// URL path prefix for download locators, e.g. `/api/download`.
    download_prefix: String,
}

impl FsArtifactStore {
    /// Create a store rooted at `models_dir`.
    ///
    /// `download_prefix` is prepended to artifact names to build the
    /// `downloadUrl` field of summaries.
    pub fn new(models_dir: impl Into<PathBuf>, download_prefix: impl Into<String>) -> Self {
        Self {
            models_dir: models_dir.into(),
            download_prefix: download_prefix.into(),
        }
    }

    /// Directory this store is rooted at.
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Resolve the filesystem path a (validated) artifact name maps to.
    ///
    /// Does not check existence; used by the training orchestrator to
    /// pick an output path before the worker runs.
    pub fn artifact_path(&self, name: &str) -> Result<PathBuf, CoreError> {
        validate_artifact_name(name)?;
        Ok(self.models_dir.join(name))
    }

    /// Resolve the path of an artifact's companion file.
    pub fn companion_path(&self, name: &str, kind: CompanionKind) -> Result<PathBuf, CoreError> {
        let artifact = self.artifact_path(name)?;
        Ok(companion_path(&artifact, kind.extension()))
    }

    /// Whether an artifact's companion file exists on disk.
    ///
    /// Only a clean NotFound counts as "does not exist"; any other
    /// stat failure is a storage fault, not an absence.
    pub async fn companion_exists(
        &self,
        name: &str,
        kind: CompanionKind,
    ) -> Result<bool, CoreError> {
        let path = self.companion_path(name, kind)?;
        match tokio::fs::metadata(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CoreError::StorageUnavailable { source }),
        }
    }

    /// Write (or overwrite) an artifact's companion file.
    ///
    /// Used by the training orchestrator to register the dataset copy
    /// and the merged metadata sidecar after a successful run.
    pub async fn write_companion(
        &self,
        name: &str,
        kind: CompanionKind,
        bytes: &[u8],
    ) -> Result<(), CoreError> {
        let path = self.companion_path(name, kind)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| CoreError::StorageUnavailable { source })
    }

    /// Build a summary from a model file path, re-statting the file.
    async fn summarize(&self, name: &str, path: &Path) -> Result<ArtifactSummary, CoreError> {
        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::NotFound {
                    entity: "Artifact",
                    name: name.to_string(),
                }
            } else {
                CoreError::StorageUnavailable { source: e }
            }
        })?;

        let modified = timestamp(meta.modified().ok());
        // Birth time is unavailable on some filesystems; fall back to mtime.
        let created = meta
            .created()
            .ok()
            .map(|t| timestamp(Some(t)))
            .unwrap_or(modified);

        Ok(ArtifactSummary {
            name: name.to_string(),
            size: meta.len(),
            created,
            last_modified: modified,
            download_url: format!("{}/{}", self.download_prefix, name),
        })
    }
}

impl ArtifactStore for FsArtifactStore {
    async fn list(&self) -> Result<Vec<ArtifactSummary>, CoreError> {
        let mut dir = tokio::fs::read_dir(&self.models_dir)
            .await
            .map_err(|source| CoreError::StorageUnavailable { source })?;

        let mut summaries = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => return Err(CoreError::StorageUnavailable { source }),
            };

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MODEL_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };

            match self.summarize(&name, &path).await {
                Ok(summary) => summaries.push(summary),
                // The file vanished between readdir and stat; skip it.
                Err(CoreError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    async fn describe(&self, name: &str) -> Result<ArtifactSummary, CoreError> {
        let path = self.artifact_path(name)?;
        self.summarize(name, &path).await
    }

    async fn read_companion(&self, name: &str, kind: CompanionKind) -> Result<Vec<u8>, CoreError> {
        let path = self.companion_path(name, kind)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::NotFound {
                    entity: kind.entity(),
                    name: name.to_string(),
                }
            } else {
                CoreError::StorageUnavailable { source: e }
            }
        })
    }

    async fn resolve_download(&self, name: &str) -> Result<PathBuf, CoreError> {
        let path = self.artifact_path(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(_) => Ok(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CoreError::NotFound {
                entity: "Artifact",
                name: name.to_string(),
            }),
            Err(source) => Err(CoreError::StorageUnavailable { source }),
        }
    }
}

/// Convert an optional [`SystemTime`] into a UTC timestamp, defaulting
/// to the epoch when the platform cannot provide one.
fn timestamp(time: Option<SystemTime>) -> DateTime<Utc> {
    time.map(DateTime::from).unwrap_or_default()
}
