use std::path::PathBuf;
use std::time::Duration;

use modelhub_core::worker::WorkerSettings;

/// URL path prefix under which raw artifact downloads are served.
pub const DOWNLOAD_PREFIX: &str = "/api/download";

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3001`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`).
    ///
    /// Requests are held open for the full lifetime of a worker
    /// process, so this must comfortably exceed the worker deadline.
    pub request_timeout_secs: u64,
    /// Maximum accepted upload size in bytes (default: 50 MiB).
    pub max_upload_bytes: usize,
    /// Directory holding model artifacts and their companions.
    pub models_dir: PathBuf,
    /// Staging directory for uploaded datasets.
    pub uploads_dir: PathBuf,
    /// Staging directory for temporary prediction payloads.
    pub staging_dir: PathBuf,
    /// Worker gateway settings (interpreter, scripts, deadline, pool size).
    pub worker: WorkerSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                  |
    /// |--------------------------|--------------------------|
    /// | `HOST`                   | `0.0.0.0`                |
    /// | `PORT`                   | `3001`                   |
    /// | `CORS_ORIGINS`           | `http://localhost:3000`  |
    /// | `REQUEST_TIMEOUT_SECS`   | `600`                    |
    /// | `MAX_UPLOAD_BYTES`       | `52428800`               |
    /// | `MODELS_DIR`             | `models`                 |
    /// | `UPLOADS_DIR`            | `uploads`                |
    /// | `STAGING_DIR`            | `staging`                |
    /// | `WORKER_INTERPRETER`     | `python3`                |
    /// | `WORKER_SCRIPTS_DIR`     | `worker`                 |
    /// | `WORKER_TIMEOUT_SECS`    | `300`                    |
    /// | `MAX_CONCURRENT_WORKERS` | `4`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3001".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (50 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let models_dir = PathBuf::from(std::env::var("MODELS_DIR").unwrap_or_else(|_| "models".into()));
        let uploads_dir =
            PathBuf::from(std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".into()));
        let staging_dir =
            PathBuf::from(std::env::var("STAGING_DIR").unwrap_or_else(|_| "staging".into()));

        let worker_timeout_secs: u64 = std::env::var("WORKER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("WORKER_TIMEOUT_SECS must be a valid u64");

        let max_concurrent: usize = std::env::var("MAX_CONCURRENT_WORKERS")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("MAX_CONCURRENT_WORKERS must be a valid usize");

        let worker = WorkerSettings {
            interpreter: std::env::var("WORKER_INTERPRETER").unwrap_or_else(|_| "python3".into()),
            scripts_dir: PathBuf::from(
                std::env::var("WORKER_SCRIPTS_DIR").unwrap_or_else(|_| "worker".into()),
            ),
            timeout: Duration::from_secs(worker_timeout_secs),
            max_concurrent,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            models_dir,
            uploads_dir,
            staging_dir,
            worker,
        }
    }
}
