//! Request artifact construction.
//!
//! Turns an identity record plus an optional external identifier into an
//! [`IdentityChangeRequest`] and the path it must be written to. Nothing here
//! touches the filesystem; writing is the bridge's job.
//!
//! Artifact naming convention:
//! `{workingDirectory}/{userName}{epochMillis}-{nonce}-input.json`
//!
//! The response artifact lives next to it with `input.json` replaced by
//! `output.json` (see [`response_path`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, BridgeResult};

/// Profile field naming the directory artifacts are written to.
pub const PROFILE_WORKING_DIRECTORY: &str = "workingDirectory";
/// Profile field naming the script to run.
pub const PROFILE_COMMAND_PATH: &str = "commandPath";
/// Older profiles name the script field after the PowerShell runtime.
pub const PROFILE_COMMAND_PATH_LEGACY: &str = "powerShellCommandPath";

const REQUEST_SUFFIX: &str = "input.json";
const RESPONSE_SUFFIX: &str = "output.json";
const NONCE_LEN: usize = 8;

/// Read-only view of an identity record as the request builder needs it.
pub trait IdentityRecord {
    fn user_name(&self) -> &str;
    fn is_active(&self) -> bool;
    fn custom_properties(&self) -> &Map<String, Value>;
}

/// Lifecycle operation carried by a request artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Create iff there is no external id; otherwise Update for active
    /// records and Delete for inactive ones.
    pub fn classify(external_id: Option<&str>, active: bool) -> Self {
        match (external_id, active) {
            (None, _) => Self::Create,
            (Some(_), true) => Self::Update,
            (Some(_), false) => Self::Delete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// The outbound artifact handed to the script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityChangeRequest {
    pub operation: Operation,
    pub user_name: String,
    pub external_id: Option<String>,
    pub file_name: String,
    pub profile: Value,
}

/// A request ready for the bridge: the document, where to write it, and
/// which script to run against it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub request: IdentityChangeRequest,
    pub request_path: PathBuf,
    pub script_path: PathBuf,
}

/// Build a request for `record`, stamped with the current time.
pub fn build_request<R: IdentityRecord + ?Sized>(
    record: &R,
    external_id: Option<&str>,
) -> BridgeResult<PreparedRequest> {
    let millis = chrono::Utc::now().timestamp_millis();
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    build_request_at(record, external_id, millis, &nonce[..NONCE_LEN])
}

/// Deterministic core of [`build_request`].
pub fn build_request_at<R: IdentityRecord + ?Sized>(
    record: &R,
    external_id: Option<&str>,
    epoch_millis: i64,
    nonce: &str,
) -> BridgeResult<PreparedRequest> {
    let user_name = normalize_user_name(record.user_name())?;
    let profile = select_profile(record.custom_properties())?;

    let working_directory = required_profile_str(profile, &[PROFILE_WORKING_DIRECTORY])?;
    let command_path =
        required_profile_str(profile, &[PROFILE_COMMAND_PATH, PROFILE_COMMAND_PATH_LEGACY])?;

    let working_directory = std::path::absolute(working_directory)
        .map_err(|e| BridgeError::io("resolving working directory", e))?;
    let request_path = working_directory.join(format!(
        "{user_name}{epoch_millis}-{nonce}-{REQUEST_SUFFIX}"
    ));

    let request = IdentityChangeRequest {
        operation: Operation::classify(external_id, record.is_active()),
        user_name,
        external_id: external_id.map(str::to_owned),
        file_name: request_path.to_string_lossy().into_owned(),
        profile: profile.clone(),
    };

    Ok(PreparedRequest {
        request,
        request_path,
        script_path: PathBuf::from(command_path),
    })
}

/// Path of the response artifact paired with `request_path`.
///
/// Replaces the trailing `input.json` (or bare `input`) of the file name
/// with `output.json` (or `output`). Names without either suffix get
/// `-output.json` appended.
pub fn response_path(request_path: &Path) -> PathBuf {
    let file_name = request_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let response_name = if let Some(stem) = file_name.strip_suffix(REQUEST_SUFFIX) {
        format!("{stem}{RESPONSE_SUFFIX}")
    } else if let Some(stem) = file_name.strip_suffix("input") {
        format!("{stem}output")
    } else {
        format!("{file_name}-{RESPONSE_SUFFIX}")
    };

    request_path.with_file_name(response_name)
}

fn normalize_user_name(raw: &str) -> BridgeResult<String> {
    let user_name = raw.to_lowercase();
    if user_name.trim().is_empty() {
        return Err(BridgeError::Configuration(
            "identity record has an empty user name".into(),
        ));
    }
    // The user name becomes part of a file name.
    if user_name.contains(['/', '\\']) || user_name.contains("..") {
        return Err(BridgeError::Configuration(format!(
            "user name '{user_name}' cannot be used in an artifact file name"
        )));
    }
    Ok(user_name)
}

fn select_profile(properties: &Map<String, Value>) -> BridgeResult<&Value> {
    let mut entries = properties.iter();
    match (entries.next(), entries.next()) {
        (Some((_, profile)), None) => {
            if profile.is_object() {
                Ok(profile)
            } else {
                Err(BridgeError::Configuration(
                    "custom properties profile must be an object".into(),
                ))
            }
        }
        (None, _) => Err(BridgeError::Configuration(
            "identity record has no custom properties profile".into(),
        )),
        (Some(_), Some(_)) => {
            let keys: Vec<&str> = properties.keys().map(String::as_str).collect();
            Err(BridgeError::Configuration(format!(
                "expected exactly one custom properties entry, found {}: {}",
                keys.len(),
                keys.join(", ")
            )))
        }
    }
}

fn required_profile_str<'a>(profile: &'a Value, names: &[&str]) -> BridgeResult<&'a str> {
    names
        .iter()
        .find_map(|name| profile.get(*name).and_then(Value::as_str))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            BridgeError::Configuration(format!("profile is missing required field '{}'", names[0]))
        })
}
