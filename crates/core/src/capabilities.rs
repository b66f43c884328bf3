//! User-management capabilities a connector can advertise to the SCIM host.

use serde::{Deserialize, Serialize};

/// Every capability class the host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    PushNewUsers,
    PushUserDeactivation,
    PushProfileUpdates,
    ReactivateUsers,
    PushPasswordUpdates,
    PushPendingUsers,
    ImportNewUsers,
    ImportProfileUpdates,
    GroupPush,
}

/// What the script connector supports: push-side user lifecycle only.
pub const IMPLEMENTED_CAPABILITIES: [Capability; 4] = [
    Capability::PushNewUsers,
    Capability::PushUserDeactivation,
    Capability::PushProfileUpdates,
    Capability::ReactivateUsers,
];
