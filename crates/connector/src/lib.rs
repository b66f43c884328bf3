//! SCIM-facing adapter for the scimbridge provisioning connector.
//!
//! The SCIM host drives [`ScimService`]; [`ScriptConnector`] implements it by
//! running each user change through the script bridge in `scimbridge-core`
//! and translating failures into [`ServiceError`]s.

pub mod config;
pub mod error;
pub mod model;
pub mod service;

pub use config::ConnectorConfig;
pub use error::{ServiceError, ServiceResult};
pub use model::{GroupOperation, GroupOutcome, ScimGroup, ScimUser, UserQueryResponse};
pub use service::{ScimService, ScriptConnector};
