//! Response artifact parsing.

use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};

const STATUS_SUCCESS: &str = "SUCCESS";

/// What the script reported back through its response artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityChangeResponse {
    Success {
        internal_id: Option<String>,
    },
    Failure {
        internal_code: Option<String>,
        details: Option<String>,
    },
}

impl IdentityChangeResponse {
    /// Parse a response document.
    ///
    /// Only malformed JSON is an error. A missing or non-`SUCCESS` status
    /// (compared case-insensitively) is a [`Failure`](Self::Failure), and
    /// fields with the wrong type are treated as absent.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        let root: Value = serde_json::from_slice(bytes)?;

        let succeeded = root
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|status| status.eq_ignore_ascii_case(STATUS_SUCCESS));

        if !succeeded {
            return Ok(Self::Failure {
                internal_code: text_field(&root, "internalCode"),
                details: text_field(&root, "details"),
            });
        }

        let internal_id = match root.get("internalId") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Null) | None => {
                tracing::debug!("Response did not carry an internal id");
                None
            }
            Some(other) => {
                tracing::debug!(internal_id = %other, "Ignoring non-string internal id");
                None
            }
        };

        Ok(Self::Success { internal_id })
    }

    /// Collapse into the bridge's result: the internal id on success, a
    /// [`BridgeError::RemoteOperation`] otherwise.
    pub fn into_result(self) -> BridgeResult<Option<String>> {
        match self {
            Self::Success { internal_id } => Ok(internal_id),
            Self::Failure {
                internal_code,
                details,
            } => Err(BridgeError::RemoteOperation {
                code: internal_code,
                details,
            }),
        }
    }
}

fn text_field(root: &Value, name: &str) -> Option<String> {
    root.get(name).and_then(Value::as_str).map(str::to_owned)
}
