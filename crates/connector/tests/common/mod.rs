use std::io::Write;
use std::path::Path;

use serde_json::{json, Map};

use scimbridge_connector::{ConnectorConfig, ScimUser, ScriptConnector};
use scimbridge_core::scripting::interpreter::InterpreterExecutor;

/// Build a test `ConnectorConfig` that runs scripts through plain `bash`.
pub fn test_config() -> ConnectorConfig {
    ConnectorConfig {
        interpreter: "bash".to_string(),
        interpreter_args: vec![],
        script_timeout: None,
        max_concurrent_scripts: 4,
    }
}

pub fn test_connector() -> ScriptConnector<InterpreterExecutor> {
    ScriptConnector::from_config(&test_config())
}

/// Create a temporary script; `$2` is the request artifact path.
pub fn write_script(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(".sh")
        .tempfile()
        .expect("create temp file");
    writeln!(f, "#!/bin/bash").expect("write shebang");
    writeln!(f, "out=\"${{2%input.json}}output.json\"").expect("write preamble");
    write!(f, "{body}").expect("write body");
    f
}

/// A user whose single profile points at `working_dir` and `script`.
pub fn user(user_name: &str, active: bool, working_dir: &Path, script: &Path) -> ScimUser {
    let mut custom_properties = Map::new();
    custom_properties.insert(
        "urn:okta:onprem_app:1.0:user:custom".to_string(),
        json!({
            "workingDirectory": working_dir.to_string_lossy(),
            "commandPath": script.to_string_lossy(),
        }),
    );
    ScimUser {
        id: None,
        user_name: user_name.to_string(),
        active,
        custom_properties,
    }
}
