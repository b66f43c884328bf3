//! SCIM service contract and the script-backed implementation.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use scimbridge_core::bridge::{CallStage, ScriptBridge};
use scimbridge_core::capabilities::{Capability, IMPLEMENTED_CAPABILITIES};
use scimbridge_core::request::build_request;
use scimbridge_core::scripting::executor::ScriptExecutor;
use scimbridge_core::scripting::interpreter::InterpreterExecutor;

use crate::config::ConnectorConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::model::{GroupOperation, GroupOutcome, ScimUser, UserQueryResponse, UNDEFINED_ID};

/// Operations the SCIM host calls on a connector.
pub trait ScimService: Send + Sync {
    /// Provision a new user. Returns the user with its id assigned.
    fn create_user(&self, user: ScimUser) -> impl Future<Output = ServiceResult<ScimUser>> + Send;

    /// Update or deactivate the user known to the host as `id`.
    fn update_user(
        &self,
        id: &str,
        user: ScimUser,
    ) -> impl Future<Output = ServiceResult<ScimUser>> + Send;

    fn get_users(&self) -> impl Future<Output = ServiceResult<UserQueryResponse>> + Send;

    fn get_user(&self, id: &str) -> impl Future<Output = ServiceResult<Option<ScimUser>>> + Send;

    fn group_operation(&self, operation: GroupOperation) -> ServiceResult<GroupOutcome>;

    fn implemented_capabilities(&self) -> Vec<Capability>;
}

/// Connector that hands every user change to an external script.
///
/// Each call runs on its own task; at most `max_concurrent_scripts` scripts
/// run at once. The connector keeps no state between calls.
pub struct ScriptConnector<E> {
    bridge: Arc<ScriptBridge<E>>,
    permits: Arc<Semaphore>,
}

impl ScriptConnector<InterpreterExecutor> {
    pub fn from_config(config: &ConnectorConfig) -> Self {
        let bridge = ScriptBridge::new(config.executor()).with_timeout(config.script_timeout);
        Self::new(bridge, config.max_concurrent_scripts)
    }
}

impl<E: ScriptExecutor + 'static> ScriptConnector<E> {
    pub fn new(bridge: ScriptBridge<E>, max_concurrent_scripts: usize) -> Self {
        Self {
            bridge: Arc::new(bridge),
            permits: Arc::new(Semaphore::new(
                max_concurrent_scripts.clamp(1, Semaphore::MAX_PERMITS),
            )),
        }
    }

    async fn call_script(
        &self,
        external_id: Option<&str>,
        user: &ScimUser,
    ) -> ServiceResult<Option<String>> {
        tracing::debug!(
            stage = CallStage::Building.as_str(),
            user_name = %user.user_name,
            external_id = ?external_id,
            "Called for user",
        );
        let prepared = build_request(user, external_id)?;

        let bridge = Arc::clone(&self.bridge);
        let permits = Arc::clone(&self.permits);
        let worker = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| ServiceError::Internal(format!("script permits closed: {e}")))?;
            bridge.invoke(&prepared).await.map_err(ServiceError::from)
        });

        worker
            .await
            .map_err(|e| ServiceError::Internal(format!("script worker failed: {e}")))?
    }
}

impl<E: ScriptExecutor + 'static> ScimService for ScriptConnector<E> {
    async fn create_user(&self, mut user: ScimUser) -> ServiceResult<ScimUser> {
        let internal_id = self.call_script(None, &user).await?;
        user.id = Some(internal_id.unwrap_or_else(|| UNDEFINED_ID.to_string()));
        Ok(user)
    }

    async fn update_user(&self, id: &str, user: ScimUser) -> ServiceResult<ScimUser> {
        self.call_script(Some(id), &user).await?;
        Ok(user)
    }

    /// There is no user directory to read from.
    async fn get_users(&self) -> ServiceResult<UserQueryResponse> {
        Ok(UserQueryResponse::empty())
    }

    async fn get_user(&self, _id: &str) -> ServiceResult<Option<ScimUser>> {
        Ok(None)
    }

    fn group_operation(&self, operation: GroupOperation) -> ServiceResult<GroupOutcome> {
        Err(ServiceError::NotImplemented {
            operation: operation.name(),
        })
    }

    fn implemented_capabilities(&self) -> Vec<Capability> {
        IMPLEMENTED_CAPABILITIES.to_vec()
    }
}
