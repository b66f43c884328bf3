//! Provisioning script execution.
//!
//! Provides the [`ScriptExecutor`](executor::ScriptExecutor) seam, the
//! interpreter-based implementation, and the shared subprocess runner.

pub mod executor;
pub mod interpreter;
pub mod subprocess;

/// Shared test helpers for executor and bridge tests.
#[cfg(test)]
pub(crate) mod test_helpers {
    use std::io::Write;

    use super::interpreter::InterpreterExecutor;

    /// Executor running scripts through plain `bash`, so `$1` is `-path`
    /// and `$2` is the request artifact path.
    pub fn bash_executor() -> InterpreterExecutor {
        InterpreterExecutor::new("bash", vec![])
    }

    /// Create a temporary shell script from the given body.
    pub fn write_temp_script(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new()
            .suffix(".sh")
            .tempfile()
            .expect("create temp file");
        writeln!(f, "#!/bin/bash").expect("write shebang");
        write!(f, "{body}").expect("write body");
        f
    }
}
