//! Collaborator seams of the decision engine.
//!
//! The engine only ever talks to the outside world through these traits.
//! `runnerscale-github`, `runnerscale-state` and the provisioners in
//! `runnerscaled` provide the production implementations; tests plug in
//! recording fakes.

use async_trait::async_trait;

use crate::error::{InventoryError, PlatformResult, ProvisionError};
use crate::types::{
    CheckRunStatus, LiveRunnerStatus, RegistrationToken, RunnerCreationRequest, RunnerRecord, Scope,
};

/// Produces API clients for the app identity or for one installation.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Client authenticated as the app itself, able to look up installations.
    async fn app_client(&self) -> PlatformResult<Box<dyn AppClient>>;

    /// Client authenticated for one installation.
    async fn installation_client(
        &self,
        installation_id: u64,
    ) -> PlatformResult<Box<dyn InstallationClient>>;
}

/// Calls available to the app identity.
#[async_trait]
pub trait AppClient: Send + Sync {
    /// Installation id of the app on the organization or repository in `scope`.
    async fn installation_id(&self, scope: &Scope) -> PlatformResult<u64>;
}

/// Calls available to an installation-scoped client.
#[async_trait]
pub trait InstallationClient: Send + Sync {
    async fn check_run_status(
        &self,
        check_run_id: u64,
        owner: &str,
        repo: &str,
    ) -> PlatformResult<CheckRunStatus>;

    /// Self-hosted runners registered for `scope`, as the platform sees them.
    async fn list_live_runners(&self, scope: &Scope) -> PlatformResult<Vec<LiveRunnerStatus>>;

    async fn create_registration_token(&self, scope: &Scope) -> PlatformResult<RegistrationToken>;
}

/// Read side of the local runner inventory.
#[async_trait]
pub trait RunnerInventory: Send + Sync {
    async fn list_tracked_runners(
        &self,
        environment: &str,
        scope: &Scope,
    ) -> Result<Vec<RunnerRecord>, InventoryError>;
}

/// Launches runner instances.
#[async_trait]
pub trait RunnerProvisioner: Send + Sync {
    async fn create_runner(&self, request: RunnerCreationRequest) -> Result<(), ProvisionError>;
}
