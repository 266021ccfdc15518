use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modelhub_core::store::FsArtifactStore;
use modelhub_core::worker::WorkerGateway;

use modelhub_api::config::{ServerConfig, DOWNLOAD_PREFIX};
use modelhub_api::router::build_app_router;
use modelhub_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modelhub_api=debug,modelhub_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Directories ---
    for dir in [&config.models_dir, &config.uploads_dir, &config.staging_dir] {
        std::fs::create_dir_all(dir)
            .unwrap_or_else(|e| panic!("Failed to create directory {}: {e}", dir.display()));
    }
    tracing::info!(
        models = %config.models_dir.display(),
        uploads = %config.uploads_dir.display(),
        staging = %config.staging_dir.display(),
        "Working directories ready"
    );

    // --- Artifact store ---
    let store = Arc::new(FsArtifactStore::new(
        config.models_dir.clone(),
        DOWNLOAD_PREFIX,
    ));

    // --- Worker gateway ---
    let gateway = Arc::new(WorkerGateway::new(config.worker.clone()));
    tracing::info!(
        interpreter = %config.worker.interpreter,
        scripts = %config.worker.scripts_dir.display(),
        max_concurrent = config.worker.max_concurrent,
        "Worker gateway ready"
    );

    // --- App state & router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        gateway,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
