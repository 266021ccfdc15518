use std::sync::Arc;

use modelhub_core::store::FsArtifactStore;
use modelhub_core::worker::WorkerGateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`). There is no
/// other shared mutable in-process state: requests only coordinate
/// through the filesystem.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Filesystem-backed artifact registry.
    pub store: Arc<FsArtifactStore>,
    /// Gateway for spawning external worker processes.
    pub gateway: Arc<WorkerGateway>,
}
