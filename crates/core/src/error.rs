//! Domain error type shared across the core crate.
//!
//! Worker-specific failures have their own type ([`crate::worker::WorkerError`])
//! because they carry captured process output; everything else funnels
//! through [`CoreError`].

/// Errors produced by the artifact store and domain validation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A named entity (artifact, companion file) does not exist.
    ///
    /// This is a normal, expected condition -- e.g. a model whose
    /// metadata sidecar has not been written yet -- and must never be
    /// conflated with a storage fault.
    #[error("{entity} '{name}' not found")]
    NotFound {
        /// Entity kind, e.g. `"Artifact"` or `"Metadata"`.
        entity: &'static str,
        /// The name that failed to resolve.
        name: String,
    },

    /// Client-supplied input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The backing artifact directory could not be read at the OS level.
    ///
    /// Signals a transient environment fault, not a data error.
    #[error("Artifact storage unavailable: {source}")]
    StorageUnavailable {
        /// Underlying I/O failure from enumerating or statting the directory.
        #[source]
        source: std::io::Error,
    },

    /// An unexpected internal failure with a human-readable message.
    #[error("{0}")]
    Internal(String),
}
