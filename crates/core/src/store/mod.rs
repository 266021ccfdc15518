//! Artifact store: a name-keyed, enumerable registry of trained models.
//!
//! [`ArtifactStore`] is the seam behind which the backing registry can
//! be swapped (e.g. for an indexed key-value store) without touching
//! orchestrator logic. The production implementation is the
//! filesystem-backed [`FsArtifactStore`].

mod fs;

pub use fs::FsArtifactStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::error::CoreError;
use crate::naming::{DATASET_EXTENSION, METADATA_EXTENSION};

/// Which sibling file of an artifact to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanionKind {
    /// The dataset the model was trained on (`.csv`).
    Dataset,
    /// The metadata sidecar (`.json`).
    Metadata,
}

impl CompanionKind {
    /// File extension (without the dot) of this companion kind.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Dataset => DATASET_EXTENSION,
            Self::Metadata => METADATA_EXTENSION,
        }
    }

    /// Entity label used in not-found errors.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Dataset => "Dataset",
            Self::Metadata => "Metadata",
        }
    }
}

/// Summary of one artifact, as returned by listing and describe calls.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    /// Unique artifact filename.
    pub name: String,
    /// Model payload size in bytes.
    pub size: u64,
    /// Creation timestamp (falls back to mtime on filesystems that do
    /// not track birth time).
    pub created: DateTime<Utc>,
    /// Last-modified timestamp.
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
    /// URL path for a raw download of the model payload.
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}

/// Name-keyed, enumerable registry of trained-model artifacts.
///
/// Every call re-reads the backing storage; there is no caching, so
/// size and timestamp fields are always current.
pub trait ArtifactStore: Send + Sync {
    /// Enumerate all artifacts, ordered by name.
    ///
    /// Fails with [`CoreError::StorageUnavailable`] if the backing
    /// directory cannot be enumerated.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<ArtifactSummary>, CoreError>> + Send;

    /// Describe a single artifact. [`CoreError::NotFound`] if the name
    /// does not resolve to an existing model file.
    fn describe(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<ArtifactSummary, CoreError>> + Send;

    /// Read the raw content of an artifact's sibling file.
    ///
    /// A missing sibling is [`CoreError::NotFound`] -- an expected
    /// condition (e.g. no metadata yet), never a storage fault.
    fn read_companion(
        &self,
        name: &str,
        kind: CompanionKind,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, CoreError>> + Send;

    /// Resolve a stable filesystem path for a binary transfer of the
    /// raw artifact bytes. [`CoreError::NotFound`] if absent.
    fn resolve_download(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<PathBuf, CoreError>> + Send;
}
