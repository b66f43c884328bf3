use scimbridge_core::error::BridgeError;

/// Error surfaced to the SCIM host.
///
/// Wraps [`BridgeError`] for script call failures and adds the
/// connector-level variants. Every variant reduces to a `(code, message)`
/// pair through [`code`](Self::code) and [`message`](Self::message).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A failure from the script bridge.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// The operation is outside the connector's capabilities.
    #[error("{operation} is not implemented by this connector")]
    NotImplemented { operation: &'static str },

    /// A worker task died before producing a result.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for service return values.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Short error code for the host. Script-reported codes pass through
    /// verbatim (empty when the script omitted one).
    pub fn code(&self) -> &str {
        match self {
            Self::Bridge(bridge) => match bridge {
                BridgeError::Configuration(_) => "CONFIGURATION_ERROR",
                BridgeError::Io { .. } => "IO_FAILURE",
                BridgeError::ProcessFailure { .. } => "PROCESS_FAILURE",
                BridgeError::MissingResponse { .. } => "MISSING_RESPONSE",
                BridgeError::RemoteOperation { code, .. } => code.as_deref().unwrap_or(""),
                BridgeError::Timeout { .. } => "SCRIPT_TIMEOUT",
            },
            Self::NotImplemented { .. } => "NOT_IMPLEMENTED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Human-readable message for the host's administrator.
    pub fn message(&self) -> String {
        match self {
            Self::Bridge(bridge) => match bridge {
                BridgeError::Configuration(msg) => msg.clone(),
                BridgeError::Io { context, source } => format!("{context} failed [{source}]"),
                // The exit code is in the logs; the host only learns that it failed.
                BridgeError::ProcessFailure { .. } => {
                    "Error return code from script process".to_string()
                }
                BridgeError::MissingResponse { path } => {
                    format!("No output file received; expecting - [{}]", path.display())
                }
                BridgeError::RemoteOperation { details, .. } => {
                    details.clone().unwrap_or_default()
                }
                BridgeError::Timeout { elapsed_ms } => {
                    format!("Script timed out after {elapsed_ms}ms")
                }
            },
            Self::NotImplemented { operation } => format!("{operation} is not supported"),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal connector error");
                "An internal error occurred".to_string()
            }
        }
    }
}
