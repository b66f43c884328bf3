//! Interpreter-hosted script executor.
//!
//! Runs `<program> <leading args…> <script> -path <request>`. The default is
//! the PowerShell command line the provisioning scripts were written for.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

use super::executor::{ScriptExecutor, ScriptExit};
use super::subprocess;
use crate::error::BridgeResult;

pub const DEFAULT_PROGRAM: &str = "powershell";
pub const DEFAULT_LEADING_ARGS: [&str; 3] = ["-nologo", "-noprofile", "-file"];

/// Flag preceding the request artifact path on the script's command line.
pub const REQUEST_PATH_FLAG: &str = "-path";

/// Executor that hands the script to an interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterExecutor {
    program: String,
    leading_args: Vec<String>,
}

impl InterpreterExecutor {
    pub fn new(program: impl Into<String>, leading_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            leading_args,
        }
    }

    /// `powershell -nologo -noprofile -file`.
    pub fn powershell() -> Self {
        Self::new(
            DEFAULT_PROGRAM,
            DEFAULT_LEADING_ARGS.iter().map(|a| a.to_string()).collect(),
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn leading_args(&self) -> &[String] {
        &self.leading_args
    }

    fn command(&self, script_path: &Path, request_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg(script_path)
            .arg(REQUEST_PATH_FLAG)
            .arg(request_path);
        cmd
    }
}

impl Default for InterpreterExecutor {
    fn default() -> Self {
        Self::powershell()
    }
}

impl ScriptExecutor for InterpreterExecutor {
    async fn execute(
        &self,
        script_path: &Path,
        request_path: &Path,
        timeout: Option<Duration>,
    ) -> BridgeResult<ScriptExit> {
        tracing::debug!(
            program = %self.program,
            args = ?self.leading_args,
            script_path = %script_path.display(),
            request_path = %request_path.display(),
            "Making external call",
        );
        let mut cmd = self.command(script_path, request_path);
        subprocess::run_command(&mut cmd, timeout).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
