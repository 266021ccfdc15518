//! Worker invocation gateway.
//!
//! Runs the external computational worker as a subprocess for one
//! bounded unit of work (train / predict / chart), captures its output
//! streams, and maps exit status onto the error taxonomy. All
//! communication with the worker goes through process arguments,
//! standard streams, and the filesystem; the worker's statistical
//! internals are opaque here.

mod gateway;
mod subprocess;

pub use gateway::{ChartImage, Prediction, TrainReport, WorkerGateway, WorkerSettings};

use std::fmt;

/// The unit of work a single worker invocation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMode {
    /// Fit a model: `train_model.py <input> <output> [target]`.
    Train,
    /// Score one payload: `predict.py <model> <input.json>`.
    Predict,
    /// Render one chart: `generate_graph.py <dataset> <kind> <x> <y>`.
    Chart,
}

impl WorkerMode {
    /// Script filename this mode maps to inside the scripts directory.
    pub fn script(self) -> &'static str {
        match self {
            Self::Train => "train_model.py",
            Self::Predict => "predict.py",
            Self::Chart => "generate_graph.py",
        }
    }
}

impl fmt::Display for WorkerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Train => "train",
            Self::Predict => "predict",
            Self::Chart => "chart",
        };
        f.write_str(label)
    }
}

/// Captured output of one completed worker process.
#[derive(Debug, Clone)]
pub struct WorkerOutput {
    /// Accumulated stdout (capped; see `subprocess::MAX_OUTPUT_BYTES`).
    pub stdout: String,
    /// Accumulated stderr (capped).
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Errors from invoking the external worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The worker process could not be started at all (interpreter or
    /// script missing, permission denied). Reported immediately,
    /// without waiting for stream events.
    #[error("Worker could not be started: {source}")]
    Launch {
        #[source]
        source: std::io::Error,
    },

    /// The worker started but exited with a non-zero code. Both
    /// streams are preserved; the caller decides whether stdout is
    /// still useful diagnostic context.
    #[error("Worker exited with code {exit_code}")]
    Failed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// The worker exceeded its configured deadline and was killed.
    /// Partial output accumulated before the kill is preserved.
    #[error("Worker timed out after {elapsed_ms}ms")]
    Timeout {
        elapsed_ms: u64,
        stdout: String,
        stderr: String,
    },

    /// The worker exited zero but did not fulfil its output contract
    /// (missing sidecar, unparsable stdout). Distinct from [`Self::Failed`]
    /// because it signals an orchestrator/worker mismatch, not a
    /// runtime problem inside the worker.
    #[error("Worker violated its output contract: {reason}")]
    ContractViolation { reason: String, stdout: String },

    /// Admission control: too many workers are already running.
    #[error("Worker capacity exceeded, try again later")]
    CapacityExceeded,

    /// An I/O error occurred while communicating with the process.
    #[error("I/O error during worker invocation: {0}")]
    Io(#[from] std::io::Error),
}
