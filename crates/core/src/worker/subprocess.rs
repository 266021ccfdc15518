//! Shared subprocess execution for worker invocations.
//!
//! Spawns the prepared command, accumulates stdout/stderr as they
//! arrive, and enforces the configured deadline. Output accumulated
//! before a kill is preserved so a timed-out worker still yields
//! diagnostic context.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::{WorkerError, WorkerOutput};

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Output beyond this limit is truncated to bound memory use under an
/// extremely verbose worker.
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Spawn `cmd`, capture both streams, and wait for exit or deadline.
///
/// The caller sets program and arguments; I/O wiring, stream capture,
/// and the timeout are handled here. Exit status is reported as-is in
/// [`WorkerOutput`]; interpreting non-zero codes is the gateway's job.
pub async fn run(cmd: &mut Command, timeout: Duration) -> Result<WorkerOutput, WorkerError> {
    // `kill_on_drop(true)` ensures the child dies with us even if this
    // future is cancelled mid-wait.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|source| WorkerError::Launch { source })?;

    // Take the stream handles and read them in spawned tasks so we can
    // still call `child.wait()` (which borrows `&mut child`).
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            let stdout_bytes = stdout_task.await.unwrap_or_default();
            let stderr_bytes = stderr_task.await.unwrap_or_default();

            Ok(WorkerOutput {
                stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
                exit_code: status.code().unwrap_or(-1),
                duration_ms,
            })
        }
        Ok(Err(e)) => Err(WorkerError::Io(e)),
        Err(_elapsed) => {
            // Deadline expired: kill the process, then drain whatever
            // the readers accumulated before the streams closed.
            let _ = child.kill().await;
            let stdout_bytes = stdout_task.await.unwrap_or_default();
            let stderr_bytes = stderr_task.await.unwrap_or_default();

            Err(WorkerError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
                stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            })
        }
    }
}

/// Read an entire output stream into a buffer, capped at [`MAX_OUTPUT_BYTES`].
///
/// Reading continues past the cap with the excess discarded; stopping
/// would leave the pipe full and block a verbose child forever.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    let Some(mut h) = handle else { return buf };
    let mut chunk = [0u8; 8192];
    loop {
        match h.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = MAX_OUTPUT_BYTES.saturating_sub(buf.len());
                buf.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    buf
}
