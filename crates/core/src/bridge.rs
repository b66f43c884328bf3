//! Out-of-process command bridge.
//!
//! One [`ScriptBridge::invoke`] call walks a single request through
//! `writing → executing → awaiting_response → parsing` and ends in
//! `succeeded` or `failed`. There is no retry: the first failure is
//! returned to the caller.

use std::path::Path;
use std::time::Duration;

use crate::error::{BridgeError, BridgeResult};
use crate::request::{response_path, IdentityChangeRequest, PreparedRequest};
use crate::response::IdentityChangeResponse;
use crate::scripting::executor::ScriptExecutor;

/// Stage of a bridge call, as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    Building,
    Writing,
    Executing,
    AwaitingResponse,
    Parsing,
    Succeeded,
    Failed,
}

impl CallStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Writing => "writing",
            Self::Executing => "executing",
            Self::AwaitingResponse => "awaiting_response",
            Self::Parsing => "parsing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Writes request artifacts, runs the script, and reads back its verdict.
#[derive(Debug, Clone)]
pub struct ScriptBridge<E> {
    executor: E,
    timeout: Option<Duration>,
}

impl<E: ScriptExecutor> ScriptBridge<E> {
    /// Bridge that waits for scripts without a time limit.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run one request through the script and return the internal id it
    /// reported, if any.
    pub async fn invoke(&self, prepared: &PreparedRequest) -> BridgeResult<Option<String>> {
        let result = self.run(prepared).await;
        match &result {
            Ok(internal_id) => tracing::info!(
                stage = CallStage::Succeeded.as_str(),
                user_name = %prepared.request.user_name,
                operation = prepared.request.operation.as_str(),
                internal_id = ?internal_id,
                "Script call succeeded",
            ),
            Err(e) => tracing::warn!(
                stage = CallStage::Failed.as_str(),
                user_name = %prepared.request.user_name,
                operation = prepared.request.operation.as_str(),
                error = %e,
                "Script call failed",
            ),
        }
        result
    }

    async fn run(&self, prepared: &PreparedRequest) -> BridgeResult<Option<String>> {
        let request_path = &prepared.request_path;

        enter(CallStage::Writing, request_path);
        write_request(&prepared.request, request_path).await?;

        enter(CallStage::Executing, request_path);
        let exit = self
            .executor
            .execute(&prepared.script_path, request_path, self.timeout)
            .await?;

        tracing::debug!(
            exit_code = ?exit.exit_code,
            duration_ms = exit.duration_ms,
            stdout = %exit.stdout,
            stderr = %exit.stderr,
            "Script exited",
        );

        if !exit.success() {
            tracing::error!(
                exit_code = ?exit.exit_code,
                script_path = %prepared.script_path.display(),
                "Error return code from script process",
            );
            return Err(BridgeError::ProcessFailure {
                exit_code: exit.exit_code,
            });
        }

        let response_path = response_path(request_path);
        enter(CallStage::AwaitingResponse, &response_path);
        let bytes = match tokio::fs::read(&response_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BridgeError::MissingResponse {
                    path: response_path,
                });
            }
            Err(e) => return Err(BridgeError::io("reading response artifact", e)),
        };

        enter(CallStage::Parsing, &response_path);
        IdentityChangeResponse::from_slice(&bytes)
            .map_err(|e| BridgeError::io("parsing response artifact", e.into()))?
            .into_result()
    }
}

fn enter(stage: CallStage, path: &Path) {
    tracing::debug!(stage = stage.as_str(), path = %path.display(), "Bridge stage");
}

/// Serialize `request` as pretty JSON, replacing any file already at `path`.
async fn write_request(request: &IdentityChangeRequest, path: &Path) -> BridgeResult<()> {
    let bytes = serde_json::to_vec_pretty(request)
        .map_err(|e| BridgeError::io("serializing request artifact", e.into()))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| BridgeError::io(format!("writing {}", path.display()), e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::request::Operation;
    use crate::scripting::interpreter::InterpreterExecutor;
    use crate::scripting::test_helpers::{bash_executor, write_temp_script};

    fn prepared(dir: &Path, script: &Path) -> PreparedRequest {
        let request_path = dir.join("alice1700000000000-abcd1234-input.json");
        PreparedRequest {
            request: IdentityChangeRequest {
                operation: Operation::Create,
                user_name: "alice".into(),
                external_id: None,
                file_name: request_path.to_string_lossy().into_owned(),
                profile: json!({
                    "workingDirectory": dir.to_string_lossy(),
                    "commandPath": script.to_string_lossy(),
                }),
            },
            request_path,
            script_path: script.to_path_buf(),
        }
    }

    /// Script that answers with `response` and exits with `code`.
    fn responding_script(response: &str, code: i32) -> tempfile::NamedTempFile {
        write_temp_script(&format!(
            "out=\"${{2%input.json}}output.json\"\ncat > \"$out\" <<'EOF'\n{response}\nEOF\nexit {code}\n"
        ))
    }

    async fn invoke_with(
        script: &tempfile::NamedTempFile,
    ) -> (tempfile::TempDir, BridgeResult<Option<String>>) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let prepared = prepared(dir.path(), script.path());
        let result = ScriptBridge::new(bash_executor()).invoke(&prepared).await;
        (dir, result)
    }

    #[tokio::test]
    async fn success_returns_internal_id() {
        let script = responding_script(r#"{"status": "SUCCESS", "internalId": "u123"}"#, 0);
        let (_dir, result) = invoke_with(&script).await;
        assert_eq!(result.expect("invoke"), Some("u123".to_string()));
    }

    #[tokio::test]
    async fn lowercase_success_is_success() {
        let script = responding_script(r#"{"status": "success", "internalId": "u123"}"#, 0);
        let (_dir, result) = invoke_with(&script).await;
        assert_eq!(result.expect("invoke"), Some("u123".to_string()));
    }

    #[tokio::test]
    async fn success_without_internal_id_is_absent() {
        let script = responding_script(r#"{"status": "SUCCESS"}"#, 0);
        let (_dir, result) = invoke_with(&script).await;
        assert_eq!(result.expect("invoke"), None);
    }

    #[tokio::test]
    async fn remote_failure_passes_code_and_details_through() {
        let script = responding_script(
            r#"{"status": "FAILURE", "internalCode": "E1", "details": "bad password"}"#,
            0,
        );
        let (_dir, result) = invoke_with(&script).await;
        assert_matches!(
            result,
            Err(BridgeError::RemoteOperation { code: Some(code), details: Some(details) })
                if code == "E1" && details == "bad password"
        );
    }

    #[tokio::test]
    async fn nonzero_exit_wins_over_valid_response() {
        let script = responding_script(r#"{"status": "SUCCESS", "internalId": "u123"}"#, 1);
        let (_dir, result) = invoke_with(&script).await;
        assert_matches!(result, Err(BridgeError::ProcessFailure { exit_code: Some(1) }));
    }

    #[tokio::test]
    async fn zero_exit_without_response_is_missing_response() {
        let script = write_temp_script("exit 0\n");
        let (dir, result) = invoke_with(&script).await;
        let expected = dir.path().join("alice1700000000000-abcd1234-output.json");
        assert_matches!(result, Err(BridgeError::MissingResponse { path }) if path == expected);
    }

    #[tokio::test]
    async fn malformed_response_is_io_failure() {
        let script = responding_script("{not json", 0);
        let (_dir, result) = invoke_with(&script).await;
        assert_matches!(result, Err(BridgeError::Io { .. }));
    }

    #[tokio::test]
    async fn script_sees_request_artifact() {
        // Echo the request back as the response's details so we can inspect it.
        let script = write_temp_script(
            "out=\"${2%input.json}output.json\"\n\
             user=$(grep -o '\"userName\": \"[a-z]*\"' \"$2\" | cut -d'\"' -f4)\n\
             printf '{\"status\":\"FAILURE\",\"internalCode\":\"ECHO\",\"details\":\"%s\"}' \"$user\" > \"$out\"\n",
        );
        let (_dir, result) = invoke_with(&script).await;
        assert_matches!(
            result,
            Err(BridgeError::RemoteOperation { details: Some(details), .. }) if details == "alice"
        );
    }

    #[tokio::test]
    async fn request_overwrites_existing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let script = responding_script(r#"{"status": "SUCCESS"}"#, 0);
        let prepared = prepared(dir.path(), script.path());
        std::fs::write(&prepared.request_path, "x".repeat(8192)).expect("seed stale request");

        ScriptBridge::new(bash_executor())
            .invoke(&prepared)
            .await
            .expect("invoke");

        let written: IdentityChangeRequest = serde_json::from_slice(
            &std::fs::read(&prepared.request_path).expect("read request"),
        )
        .expect("request is valid json");
        assert_eq!(written, prepared.request);
    }

    #[tokio::test]
    async fn unwritable_directory_is_io_failure() {
        let script = responding_script(r#"{"status": "SUCCESS"}"#, 0);
        let prepared = prepared(&PathBuf::from("/nonexistent/spool"), script.path());
        let result = ScriptBridge::new(bash_executor()).invoke(&prepared).await;
        assert_matches!(result, Err(BridgeError::Io { .. }));
    }

    #[tokio::test]
    async fn configured_timeout_stops_hung_script() {
        let script = write_temp_script("sleep 60\n");
        let dir = tempfile::tempdir().expect("create temp dir");
        let prepared = prepared(dir.path(), script.path());
        let result = ScriptBridge::new(bash_executor())
            .with_timeout(Some(Duration::from_millis(200)))
            .invoke(&prepared)
            .await;
        assert_matches!(result, Err(BridgeError::Timeout { .. }));
    }

    #[tokio::test]
    async fn returns_when_script_exits_despite_background_child() {
        let script = write_temp_script(
            "out=\"${2%input.json}output.json\"\n\
             printf '{\"status\":\"SUCCESS\",\"internalId\":\"u1\"}' > \"$out\"\n\
             sleep 5 &\n\
             exit 0\n",
        );
        let dir = tempfile::tempdir().expect("create temp dir");
        let prepared = prepared(dir.path(), script.path());
        let start = std::time::Instant::now();
        let result = ScriptBridge::new(bash_executor())
            .with_timeout(Some(Duration::from_secs(1)))
            .invoke(&prepared)
            .await;
        assert_eq!(result.expect("invoke"), Some("u1".to_string()));
        assert!(start.elapsed() < Duration::from_secs(3), "took {:?}", start.elapsed());
    }

    #[tokio::test]
    async fn missing_interpreter_is_io_failure() {
        let script = write_temp_script("exit 0\n");
        let dir = tempfile::tempdir().expect("create temp dir");
        let prepared = prepared(dir.path(), script.path());
        let executor = InterpreterExecutor::new("/nonexistent/powershell", vec![]);
        let result = ScriptBridge::new(executor).invoke(&prepared).await;
        assert_matches!(result, Err(BridgeError::Io { .. }));
    }
}
