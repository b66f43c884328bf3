//! Script launch interface and shared types.
//!
//! Defines [`ScriptExecutor`], the seam the bridge uses to run a provisioning
//! script against a request artifact, along with [`ScriptExit`].

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::error::BridgeResult;

/// How a script process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptExit {
    /// Process exit code (`None` if terminated by a signal).
    pub exit_code: Option<i32>,
    /// Captured stdout. Not part of the script contract; kept for logging.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ScriptExit {
    /// Only a clean exit with code 0 counts as success.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launches a provisioning script for one request artifact.
///
/// Implementations must close the child's stdin, wait for it to exit (or
/// for `timeout` to elapse, when one is given), and report how it ended.
/// A non-zero exit is a normal [`ScriptExit`], not an error.
pub trait ScriptExecutor: Send + Sync {
    fn execute(
        &self,
        script_path: &Path,
        request_path: &Path,
        timeout: Option<Duration>,
    ) -> impl Future<Output = BridgeResult<ScriptExit>> + Send;
}
