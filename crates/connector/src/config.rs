use std::time::Duration;

use tokio::sync::Semaphore;

use scimbridge_core::scripting::interpreter::{
    InterpreterExecutor, DEFAULT_LEADING_ARGS, DEFAULT_PROGRAM,
};

/// Default number of scripts allowed to run at the same time.
pub const DEFAULT_MAX_CONCURRENT_SCRIPTS: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{name} must be at most {max}, got {value}")]
    TooLarge {
        name: &'static str,
        value: u64,
        max: usize,
    },
}

/// Connector configuration loaded from environment variables.
///
/// All fields have defaults matching the PowerShell deployment the
/// provisioning scripts target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Program that hosts the script (default: `powershell`).
    pub interpreter: String,
    /// Arguments placed before the script path.
    pub interpreter_args: Vec<String>,
    /// Kill scripts running longer than this. `None` waits indefinitely.
    pub script_timeout: Option<Duration>,
    /// Upper bound on scripts running at once.
    pub max_concurrent_scripts: usize,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_PROGRAM.to_string(),
            interpreter_args: DEFAULT_LEADING_ARGS.iter().map(|a| a.to_string()).collect(),
            script_timeout: None,
            max_concurrent_scripts: DEFAULT_MAX_CONCURRENT_SCRIPTS,
        }
    }
}

impl ConnectorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                     |
    /// |---------------------------|-----------------------------|
    /// | `SCRIPT_INTERPRETER`      | `powershell`                |
    /// | `SCRIPT_INTERPRETER_ARGS` | `-nologo -noprofile -file`  |
    /// | `SCRIPT_TIMEOUT_SECS`     | unset (no timeout)          |
    /// | `MAX_CONCURRENT_SCRIPTS`  | `16`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let interpreter = lookup("SCRIPT_INTERPRETER")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.interpreter);

        // An explicitly empty value means "no leading arguments".
        let interpreter_args = lookup("SCRIPT_INTERPRETER_ARGS")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or(defaults.interpreter_args);

        let script_timeout = match parse_number(&lookup, "SCRIPT_TIMEOUT_SECS")? {
            None | Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        let max_concurrent_scripts = match parse_number(&lookup, "MAX_CONCURRENT_SCRIPTS")? {
            None => defaults.max_concurrent_scripts,
            Some(0) => return Err(ConfigError::Zero("MAX_CONCURRENT_SCRIPTS")),
            Some(n) => match usize::try_from(n) {
                Ok(n) if n <= Semaphore::MAX_PERMITS => n,
                _ => {
                    return Err(ConfigError::TooLarge {
                        name: "MAX_CONCURRENT_SCRIPTS",
                        value: n,
                        max: Semaphore::MAX_PERMITS,
                    })
                }
            },
        };

        Ok(Self {
            interpreter,
            interpreter_args,
            script_timeout,
            max_concurrent_scripts,
        })
    }

    pub fn executor(&self) -> InterpreterExecutor {
        InterpreterExecutor::new(self.interpreter.clone(), self.interpreter_args.clone())
    }
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
    }
}
