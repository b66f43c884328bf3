//! The slice of the SCIM resource model the connector touches.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use scimbridge_core::request::IdentityRecord;

/// Id given to created users whose script did not report one.
pub const UNDEFINED_ID: &str = "UNDEFINED";

/// A SCIM user as handed over by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Keyed by custom schema URN; the connector expects exactly one entry.
    #[serde(default)]
    pub custom_properties: Map<String, Value>,
}

fn default_active() -> bool {
    true
}

impl IdentityRecord for ScimUser {
    fn user_name(&self) -> &str {
        &self.user_name
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn custom_properties(&self) -> &Map<String, Value> {
        &self.custom_properties
    }
}

/// A page of users returned from a directory query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQueryResponse {
    pub total_results: u64,
    pub users: Vec<ScimUser>,
}

impl UserQueryResponse {
    /// A fresh response with no users.
    pub fn empty() -> Self {
        Self {
            total_results: 0,
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Group management requests the host may issue.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOperation {
    Create(ScimGroup),
    Update { id: String, group: ScimGroup },
    Get(String),
    Delete(String),
    List,
}

impl GroupOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "createGroup",
            Self::Update { .. } => "updateGroup",
            Self::Get(_) => "getGroup",
            Self::Delete(_) => "deleteGroup",
            Self::List => "getGroups",
        }
    }
}

/// What a supported group operation would produce.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    Group(ScimGroup),
    Groups(Vec<ScimGroup>),
    Deleted,
}
