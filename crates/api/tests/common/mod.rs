//! Shared test harness: a full application router wired to temporary
//! directories and `/bin/sh` fake worker scripts, so integration tests
//! exercise the same middleware stack production uses without needing
//! Python or a real model.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use modelhub_api::config::{ServerConfig, DOWNLOAD_PREFIX};
use modelhub_api::router::build_app_router;
use modelhub_api::state::AppState;
use modelhub_core::store::FsArtifactStore;
use modelhub_core::worker::{WorkerGateway, WorkerSettings};

/// Multipart boundary used by [`train_request`].
pub const BOUNDARY: &str = "X-TEST-BOUNDARY";

/// A running test application plus the directories behind it.
pub struct TestEnv {
    pub app: Router,
    pub models_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub scripts_dir: PathBuf,
    _root: TempDir,
}

impl TestEnv {
    /// Build an environment with well-behaved default fake workers.
    pub fn new() -> Self {
        let root = TempDir::new().expect("tempdir");
        let models_dir = root.path().join("models");
        let uploads_dir = root.path().join("uploads");
        let staging_dir = root.path().join("staging");
        let scripts_dir = root.path().join("scripts");
        for dir in [&models_dir, &uploads_dir, &staging_dir, &scripts_dir] {
            std::fs::create_dir_all(dir).expect("create dir");
        }

        let env = Self {
            app: Router::new(), // replaced below once scripts exist
            models_dir,
            uploads_dir,
            staging_dir,
            scripts_dir,
            _root: root,
        };

        env.write_script(
            "train_model.py",
            r#"
echo "Loaded data from $1"
printf fake-model-bytes > "$2"
target="${3:-species}"
sidecar="${2%.pkl}.json"
cat > "$sidecar" <<EOF
{"features":["sepal_length","sepal_width","petal_length","petal_width"],"target_column":"$target","problem_type":"classification","metrics":{"accuracy":0.95}}
EOF
echo "Model saved to $2"
"#,
        );
        env.write_script(
            "predict.py",
            r#"printf '{"status":"success","prediction":["setosa"]}'"#,
        );
        env.write_script(
            "generate_graph.py",
            r#"printf '{"status":"success","image":"aGVsbG8="}'"#,
        );

        env.rebuild()
    }

    /// Overwrite one of the fake worker scripts.
    ///
    /// The gateway resolves script paths at invocation time, so this
    /// takes effect immediately without rebuilding the router.
    pub fn write_script(&self, name: &str, body: &str) {
        std::fs::write(self.scripts_dir.join(name), body).expect("write script");
    }

    fn rebuild(mut self) -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".to_string()],
            request_timeout_secs: 30,
            max_upload_bytes: 10 * 1024 * 1024,
            models_dir: self.models_dir.clone(),
            uploads_dir: self.uploads_dir.clone(),
            staging_dir: self.staging_dir.clone(),
            worker: WorkerSettings {
                interpreter: "/bin/sh".to_string(),
                scripts_dir: self.scripts_dir.clone(),
                timeout: Duration::from_secs(10),
                max_concurrent: 4,
            },
        };

        let store = Arc::new(FsArtifactStore::new(
            self.models_dir.clone(),
            DOWNLOAD_PREFIX,
        ));
        let gateway = Arc::new(WorkerGateway::new(config.worker.clone()));
        let state = AppState {
            config: Arc::new(config.clone()),
            store,
            gateway,
        };

        self.app = build_app_router(state, &config);
        self
    }

    /// Register a fake artifact directly on disk, bypassing training.
    pub fn seed_model(&self, name: &str, bytes: &[u8]) {
        std::fs::write(self.models_dir.join(name), bytes).expect("seed model");
    }

    /// Write a companion file next to a seeded artifact.
    pub fn seed_companion(&self, model_name: &str, extension: &str, bytes: &[u8]) {
        let stem = model_name.trim_end_matches(".pkl");
        std::fs::write(self.models_dir.join(format!("{stem}.{extension}")), bytes)
            .expect("seed companion");
    }

    /// Names of files currently present in a staging-type directory.
    pub fn dir_entries(dir: &std::path::Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

/// Send a request and return status plus parsed JSON body.
pub async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let json = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("non-JSON body ({e}): {}", String::from_utf8_lossy(&bytes)));
    (status, json)
}

/// Send a request and return status, content type, and raw body bytes.
pub async fn send_raw(app: Router, request: Request<Body>) -> (StatusCode, String, Vec<u8>) {
    let response = app.oneshot(request).await.expect("request");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap_or("").to_string())
        .unwrap_or_default();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    (status, content_type, bytes.to_vec())
}

/// Build a GET request.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

/// Build a POST request with a JSON body.
pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Build a `POST /api/train` multipart request.
///
/// `file` is `(filename, content)`; pass `None` to omit the file field
/// entirely (scenario: nothing uploaded).
pub fn train_request(file: Option<(&str, &str)>, target_column: Option<&str>) -> Request<Body> {
    let mut body = String::new();

    if let Some((filename, content)) = file {
        body.push_str(&format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {content}\r\n"
        ));
    }
    if let Some(target) = target_column {
        body.push_str(&format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"targetColumn\"\r\n\r\n\
             {target}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/train")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}
