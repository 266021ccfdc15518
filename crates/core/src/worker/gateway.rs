//! The gateway that runs exactly one worker process per call.
//!
//! [`WorkerGateway::invoke`] is mode-agnostic: spawn, capture, map
//! exit status. The mode wrappers ([`train`](WorkerGateway::train),
//! [`predict`](WorkerGateway::predict), [`chart`](WorkerGateway::chart))
//! additionally validate each mode's output contract -- the sidecar a
//! training run must leave behind, or the single JSON document predict
//! and chart must print -- so orchestrators never have to discover a
//! broken contract after the fact.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::metadata::TrainingSidecar;
use crate::naming::{companion_path, METADATA_EXTENSION};

use super::subprocess;
use super::{WorkerError, WorkerMode, WorkerOutput};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Interpreter the scripts run under (default `python3`).
    ///
    /// Configurable so tests can substitute `/bin/sh` fakes.
    pub interpreter: String,
    /// Directory containing the three mode scripts.
    pub scripts_dir: PathBuf,
    /// Wall-clock deadline per invocation; the process is killed when
    /// it expires.
    pub timeout: Duration,
    /// Upper bound on simultaneously running worker processes.
    pub max_concurrent: usize,
}

/// Result of a successful training invocation: the worker's sidecar
/// plus the captured process output.
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Validated sidecar the worker wrote next to the artifact.
    pub sidecar: TrainingSidecar,
    /// Captured process output (progress log on stdout).
    pub output: WorkerOutput,
}

/// Result of a successful prediction invocation.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// The prediction value as reported by the worker.
    pub value: serde_json::Value,
    /// Captured process output.
    pub output: WorkerOutput,
}

/// Result of a successful chart invocation.
#[derive(Debug, Clone)]
pub struct ChartImage {
    /// Base64-encoded PNG produced by the worker.
    pub image: String,
    /// Captured process output.
    pub output: WorkerOutput,
}

/// Stdout document printed by the predict script on success.
#[derive(Debug, Deserialize)]
struct PredictReply {
    status: String,
    #[serde(default)]
    prediction: serde_json::Value,
}

/// Stdout document printed by the chart script on success.
#[derive(Debug, Deserialize)]
struct ChartReply {
    status: String,
    #[serde(default)]
    image: Option<String>,
}

/// Runs external worker processes with admission control and a deadline.
pub struct WorkerGateway {
    settings: WorkerSettings,
    /// Bounds concurrent worker processes; acquisition never waits, a
    /// full pool is reported as [`WorkerError::CapacityExceeded`].
    slots: Semaphore,
}

impl WorkerGateway {
    pub fn new(settings: WorkerSettings) -> Self {
        let slots = Semaphore::new(settings.max_concurrent);
        Self { settings, slots }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Run one worker process in `mode` with the given arguments.
    ///
    /// Success is defined purely by exit code 0; any non-zero code is
    /// surfaced as [`WorkerError::Failed`] with both streams attached.
    /// Stdout is never interpreted here.
    pub async fn invoke(
        &self,
        mode: WorkerMode,
        args: Vec<OsString>,
    ) -> Result<WorkerOutput, WorkerError> {
        let _permit = self
            .slots
            .try_acquire()
            .map_err(|_| WorkerError::CapacityExceeded)?;

        let script = self.settings.scripts_dir.join(mode.script());
        let mut cmd = Command::new(&self.settings.interpreter);
        cmd.arg(&script).args(&args);

        tracing::info!(%mode, script = %script.display(), "Invoking worker");
        let output = subprocess::run(&mut cmd, self.settings.timeout).await?;
        tracing::info!(
            %mode,
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            "Worker finished"
        );

        if output.exit_code != 0 {
            return Err(WorkerError::Failed {
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    /// Train mode: `train_model.py <input> <output> [target]`.
    ///
    /// On exit 0 the worker must have written a metadata sidecar next
    /// to `output_path`; a missing or unparsable sidecar is a
    /// [`WorkerError::ContractViolation`]. Partially written files are
    /// left in place for the store to show -- a visible inconsistency,
    /// not silently cleaned up.
    pub async fn train(
        &self,
        input_path: &Path,
        output_path: &Path,
        target: Option<&str>,
    ) -> Result<TrainReport, WorkerError> {
        let mut args = vec![input_path.as_os_str().to_owned(), output_path.as_os_str().to_owned()];
        if let Some(target) = target {
            args.push(OsString::from(target));
        }

        let output = self.invoke(WorkerMode::Train, args).await?;

        let sidecar_path = companion_path(output_path, METADATA_EXTENSION);
        let raw = match tokio::fs::read(&sidecar_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WorkerError::ContractViolation {
                    reason: format!(
                        "training worker exited 0 but wrote no sidecar at {}",
                        sidecar_path.display()
                    ),
                    stdout: output.stdout,
                });
            }
            Err(e) => return Err(WorkerError::Io(e)),
        };

        let sidecar: TrainingSidecar = serde_json::from_slice(&raw).map_err(|e| {
            WorkerError::ContractViolation {
                reason: format!("training sidecar is not valid metadata JSON: {e}"),
                stdout: output.stdout.clone(),
            }
        })?;

        Ok(TrainReport { sidecar, output })
    }

    /// Predict mode: `predict.py <model> <input.json>`.
    ///
    /// On exit 0 stdout must be a single JSON document with
    /// `status: "success"` and a `prediction` field.
    pub async fn predict(
        &self,
        model_path: &Path,
        input_path: &Path,
    ) -> Result<Prediction, WorkerError> {
        let args = vec![model_path.as_os_str().to_owned(), input_path.as_os_str().to_owned()];
        let output = self.invoke(WorkerMode::Predict, args).await?;

        let reply: PredictReply =
            serde_json::from_str(output.stdout.trim()).map_err(|e| {
                WorkerError::ContractViolation {
                    reason: format!("prediction output is not valid JSON: {e}"),
                    stdout: output.stdout.clone(),
                }
            })?;

        if reply.status != "success" {
            return Err(WorkerError::ContractViolation {
                reason: format!(
                    "prediction worker exited 0 but reported status '{}'",
                    reply.status
                ),
                stdout: output.stdout.clone(),
            });
        }

        Ok(Prediction {
            value: reply.prediction,
            output,
        })
    }

    /// Chart mode: `generate_graph.py <dataset> <kind> <x> <y>`.
    ///
    /// On exit 0 stdout must be a single JSON document with
    /// `status: "success"` and an embedded base64 `image`.
    pub async fn chart(
        &self,
        dataset_path: &Path,
        chart_kind: &str,
        x_column: &str,
        y_column: &str,
    ) -> Result<ChartImage, WorkerError> {
        let args = vec![
            dataset_path.as_os_str().to_owned(),
            OsString::from(chart_kind),
            OsString::from(x_column),
            OsString::from(y_column),
        ];
        let output = self.invoke(WorkerMode::Chart, args).await?;

        let reply: ChartReply = serde_json::from_str(output.stdout.trim()).map_err(|e| {
            WorkerError::ContractViolation {
                reason: format!("chart output is not valid JSON: {e}"),
                stdout: output.stdout.clone(),
            }
        })?;

        match reply {
            ChartReply {
                status,
                image: Some(image),
            } if status == "success" => Ok(ChartImage { image, output }),
            ChartReply { status, .. } => Err(WorkerError::ContractViolation {
                reason: format!(
                    "chart worker exited 0 but returned status '{status}' or no image"
                ),
                stdout: output.stdout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;

    /// Gateway whose "interpreter" is /bin/sh, pointed at a scripts
    /// directory of shell fakes named like the real worker scripts.
    fn sh_gateway(scripts_dir: &Path, max_concurrent: usize) -> WorkerGateway {
        WorkerGateway::new(WorkerSettings {
            interpreter: "/bin/sh".into(),
            scripts_dir: scripts_dir.to_path_buf(),
            timeout: Duration::from_secs(5),
            max_concurrent,
        })
    }

    fn write_script(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn train_reads_back_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "train_model.py",
            r#"
echo "training on $1"
printf fakemodel > "$2"
sidecar="${2%.pkl}.json"
printf '{"features":["a","b"],"target_column":"y","problem_type":"regression","metrics":{"mse":1.0}}' > "$sidecar"
"#,
        );

        let models = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        fs::write(&input, "a,b,y\n1,2,3\n").unwrap();
        let output = models.path().join("t_model.pkl");

        let report = sh_gateway(dir.path(), 2)
            .train(&input, &output, None)
            .await
            .unwrap();

        assert_eq!(report.sidecar.features, vec!["a", "b"]);
        assert_eq!(report.sidecar.target_column, "y");
        assert!(report.output.stdout.contains("training on"));
        assert!(output.exists());
    }

    #[tokio::test]
    async fn train_forwards_target_argument() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "train_model.py",
            r#"
printf m > "$2"
printf '{"features":["a"],"target_column":"%s","problem_type":"regression","metrics":{}}' "$3" > "${2%.pkl}.json"
"#,
        );

        let models = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        fs::write(&input, "a,y\n1,2\n").unwrap();
        let output = models.path().join("t_model.pkl");

        let report = sh_gateway(dir.path(), 2)
            .train(&input, &output, Some("price"))
            .await
            .unwrap();
        assert_eq!(report.sidecar.target_column, "price");
    }

    #[tokio::test]
    async fn train_missing_sidecar_is_contract_violation() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "train_model.py", "printf m > \"$2\"\n");

        let models = tempfile::tempdir().unwrap();
        let output = models.path().join("t_model.pkl");
        let err = sh_gateway(dir.path(), 2)
            .train(Path::new("/dev/null"), &output, None)
            .await
            .unwrap_err();
        assert_matches!(err, WorkerError::ContractViolation { .. });
    }

    #[tokio::test]
    async fn train_failure_carries_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "train_model.py",
            "echo 'Loaded data'\necho 'ValueError: target column not found' >&2\nexit 1\n",
        );

        let err = sh_gateway(dir.path(), 2)
            .train(Path::new("/dev/null"), Path::new("/tmp/x_model.pkl"), None)
            .await
            .unwrap_err();
        match err {
            WorkerError::Failed {
                exit_code,
                stdout,
                stderr,
            } => {
                assert_eq!(exit_code, 1);
                assert!(stdout.contains("Loaded data"));
                assert!(stderr.contains("ValueError: target column not found"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn predict_parses_stdout_json() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "predict.py",
            r#"printf '{"status":"success","prediction":[42.5]}'"#,
        );

        let prediction = sh_gateway(dir.path(), 2)
            .predict(Path::new("/tmp/m.pkl"), Path::new("/tmp/in.json"))
            .await
            .unwrap();
        assert_eq!(prediction.value, serde_json::json!([42.5]));
    }

    #[tokio::test]
    async fn predict_garbage_stdout_is_contract_violation() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "predict.py", "echo not-json-at-all\n");

        let err = sh_gateway(dir.path(), 2)
            .predict(Path::new("/tmp/m.pkl"), Path::new("/tmp/in.json"))
            .await
            .unwrap_err();
        assert_matches!(err, WorkerError::ContractViolation { .. });
    }

    #[tokio::test]
    async fn chart_returns_embedded_image() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "generate_graph.py",
            r#"printf '{"status":"success","image":"aGVsbG8="}'"#,
        );

        let chart = sh_gateway(dir.path(), 2)
            .chart(Path::new("/tmp/d.csv"), "scatter", "x", "y")
            .await
            .unwrap();
        assert_eq!(chart.image, "aGVsbG8=");
    }

    #[tokio::test]
    async fn missing_interpreter_is_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "predict.py", "true\n");

        let gateway = WorkerGateway::new(WorkerSettings {
            interpreter: "/nonexistent/python3".into(),
            scripts_dir: dir.path().to_path_buf(),
            timeout: Duration::from_secs(5),
            max_concurrent: 2,
        });
        let err = gateway
            .predict(Path::new("/tmp/m.pkl"), Path::new("/tmp/in.json"))
            .await
            .unwrap_err();
        assert_matches!(err, WorkerError::Launch { .. });
    }

    #[tokio::test]
    async fn full_pool_is_capacity_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "predict.py", "sleep 2\n");
        write_script(
            dir.path(),
            "generate_graph.py",
            r#"printf '{"status":"success","image":"eA=="}'"#,
        );

        let gateway = std::sync::Arc::new(sh_gateway(dir.path(), 1));

        // Occupy the single slot with a slow predict, then try a chart.
        let slow = {
            let gateway = std::sync::Arc::clone(&gateway);
            tokio::spawn(async move {
                let _ = gateway
                    .predict(Path::new("/tmp/m.pkl"), Path::new("/tmp/in.json"))
                    .await;
            })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;

        let err = gateway
            .chart(Path::new("/tmp/d.csv"), "line", "x", "y")
            .await
            .unwrap_err();
        assert_matches!(err, WorkerError::CapacityExceeded);

        slow.abort();
    }
}
