//! Domain logic for the scimbridge provisioning connector.
//!
//! Builds request artifacts from identity records, runs the external
//! provisioning script against them, and turns its response artifact into
//! an internal id or a typed [`BridgeError`](error::BridgeError). Nothing
//! here knows about the SCIM host; see `scimbridge-connector` for that.

pub mod bridge;
pub mod capabilities;
pub mod error;
pub mod request;
pub mod response;
pub mod scripting;
