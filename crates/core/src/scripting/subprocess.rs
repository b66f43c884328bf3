//! Shared subprocess management.
//!
//! Provides [`run_command`]: executors build a [`tokio::process::Command`]
//! for their runtime and delegate spawn, output draining, and the optional
//! timeout here.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use super::executor::ScriptExit;
use crate::error::{BridgeError, BridgeResult};

/// Maximum stdout or stderr size captured per stream (1 MiB).
///
/// Scripts talk through the response artifact, so anything beyond this is
/// only log noise.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// How long the output readers may keep running after the child exits.
///
/// A background process started by the script inherits its pipes and keeps
/// them open; the call must not wait on it.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Spawn `cmd`, close its stdin, drain stdout/stderr, and wait for exit.
///
/// With `timeout` set the child is killed once it elapses and
/// [`BridgeError::Timeout`] is returned. Without it the call waits for as
/// long as the script runs.
pub async fn run_command(cmd: &mut Command, timeout: Option<Duration>) -> BridgeResult<ScriptExit> {
    // A null stdin means scripts that read input see EOF instead of hanging.
    // `kill_on_drop(true)` ensures the child is killed when dropped (e.g. on timeout).
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd
        .spawn()
        .map_err(|e| BridgeError::io(format!("spawning {program}"), e))?;

    // Read the pipes in spawned tasks so a chatty child cannot block on a
    // full pipe while we wait on it.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let wait_result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(result) => result,
            Err(_elapsed) => {
                // `child` is dropped on return, which kills the process.
                return Err(BridgeError::Timeout {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }
        },
        None => child.wait().await,
    };

    let status = wait_result.map_err(|e| BridgeError::io(format!("waiting for {program}"), e))?;
    let duration_ms = start.elapsed().as_millis() as u64;

    let (stdout_bytes, stderr_bytes) = tokio::join!(
        collect_stream(stdout_task, &program),
        collect_stream(stderr_task, &program),
    );

    Ok(ScriptExit {
        exit_code: status.code(),
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        duration_ms,
    })
}

/// Await a reader task for at most [`DRAIN_GRACE`], aborting it on expiry.
async fn collect_stream(mut task: JoinHandle<Vec<u8>>, program: &str) -> Vec<u8> {
    match tokio::time::timeout(DRAIN_GRACE, &mut task).await {
        Ok(joined) => joined.unwrap_or_default(),
        Err(_elapsed) => {
            task.abort();
            tracing::debug!(%program, "Output pipe still open after exit, dropping captured output");
            Vec::new()
        }
    }
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}
