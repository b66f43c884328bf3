use std::path::PathBuf;

/// Failures of a single bridge call. Every variant is terminal for that call.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O failure while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Script process exited unsuccessfully")]
    ProcessFailure { exit_code: Option<i32> },

    #[error("No response artifact received; expected {}", path.display())]
    MissingResponse { path: PathBuf },

    #[error(
        "Script reported failure [{}]: {}",
        code.as_deref().unwrap_or(""),
        details.as_deref().unwrap_or("")
    )]
    RemoteOperation {
        code: Option<String>,
        details: Option<String>,
    },

    #[error("Script timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

impl BridgeError {
    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
