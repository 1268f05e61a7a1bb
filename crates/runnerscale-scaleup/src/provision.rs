//! Registration-token-then-create handshake for one admitted category.

use tracing::info;

use runnerscale_core::{
    InstallationClient, RunnerCategory, RunnerConfig, RunnerCreationRequest, RunnerProvisioner,
    ScaleUpConfig, Scope,
};

use crate::error::{ScaleUpError, ScaleUpResult};

/// Request a fresh registration token for `scope` and ask the provisioner
/// to launch one runner of `category` with it.
///
/// The token is consumed into the runner configuration and never logged.
pub async fn provision_runner(
    client: &dyn InstallationClient,
    provisioner: &dyn RunnerProvisioner,
    config: &ScaleUpConfig,
    scope: &Scope,
    category: &RunnerCategory,
) -> ScaleUpResult<()> {
    let token = client
        .create_registration_token(scope)
        .await
        .map_err(ScaleUpError::PlatformApi)?;

    let runner_config = RunnerConfig::compose(
        config.web_base_url(),
        scope,
        &token,
        &category.name,
        &config.extra_labels,
        config.runner_group.as_deref(),
    );
    drop(token);

    info!(
        %scope,
        category = %category.name,
        url = %runner_config.url,
        labels = %runner_config.labels.join(","),
        runner_group = runner_config.runner_group.as_deref().unwrap_or("-"),
        "requesting runner creation"
    );

    provisioner
        .create_runner(RunnerCreationRequest {
            environment: config.environment.clone(),
            scope: scope.clone(),
            category: category.clone(),
            runner_config,
        })
        .await?;

    Ok(())
}
