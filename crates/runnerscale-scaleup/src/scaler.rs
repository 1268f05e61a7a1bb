//! ScaleUp — the per-event capacity decision.
//!
//! Resolves the scope of a queued job, drops events whose check run is no
//! longer queued, then walks every configured runner category and launches
//! at most one runner per category when its ceiling allows and all of its
//! visible runners are busy.

use std::sync::Arc;

use tracing::{debug, info, warn};

use runnerscale_core::{
    ActionRequestMessage, Authenticator, CategoryTable, CheckRunStatus, InstallationClient,
    RunnerCategory, RunnerInventory, RunnerProvisioner, RunnerRecord, ScaleUpConfig, Scope,
};

use crate::admission::{Admission, all_matching_busy};
use crate::error::{ScaleUpError, ScaleUpResult};
use crate::provision::provision_runner;
use crate::target;

/// What happened to one category during a decision.
#[derive(Debug)]
pub enum CategoryOutcome {
    /// Tracked runners already reach the ceiling.
    AtCapacity { current: usize, max: u32 },
    /// At least one matching runner is idle and can take the job.
    IdleRunnerAvailable { idle: usize },
    /// One runner was requested.
    Provisioned,
    /// This category failed; the others were still evaluated.
    Failed(ScaleUpError),
}

/// Result of handling one event.
#[derive(Debug)]
pub enum ScaleUpReport {
    /// The check run was no longer queued; nothing was evaluated.
    Skipped { status: CheckRunStatus },
    /// Every category was evaluated, in table order.
    Evaluated {
        scope: Scope,
        outcomes: Vec<(String, CategoryOutcome)>,
    },
}

impl ScaleUpReport {
    /// Number of runners requested.
    pub fn provisioned(&self) -> usize {
        self.outcomes()
            .iter()
            .filter(|(_, o)| matches!(o, CategoryOutcome::Provisioned))
            .count()
    }

    pub fn outcome(&self, category: &str) -> Option<&CategoryOutcome> {
        self.outcomes()
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, o)| o)
    }

    pub fn outcomes(&self) -> &[(String, CategoryOutcome)] {
        match self {
            ScaleUpReport::Skipped { .. } => &[],
            ScaleUpReport::Evaluated { outcomes, .. } => outcomes,
        }
    }

    /// Surface the first failed category as an error.
    ///
    /// Callers that rely on event redelivery use this so a partially
    /// failed decision is not acknowledged as done.
    pub fn into_result(self) -> ScaleUpResult<ScaleUpReport> {
        match self {
            ScaleUpReport::Evaluated {
                scope,
                mut outcomes,
            } => {
                let failed = outcomes
                    .iter()
                    .position(|(_, o)| matches!(o, CategoryOutcome::Failed(_)));
                if let Some(index) = failed {
                    let (category, outcome) = outcomes.swap_remove(index);
                    if let CategoryOutcome::Failed(source) = outcome {
                        return Err(ScaleUpError::Category {
                            category,
                            source: Box::new(source),
                        });
                    }
                }
                Ok(ScaleUpReport::Evaluated { scope, outcomes })
            }
            skipped => Ok(skipped),
        }
    }
}

/// The scale-up decision engine.
///
/// Holds no state between events; everything is read fresh per call.
pub struct ScaleUp {
    config: ScaleUpConfig,
    categories: Arc<CategoryTable>,
    auth: Arc<dyn Authenticator>,
    inventory: Arc<dyn RunnerInventory>,
    provisioner: Arc<dyn RunnerProvisioner>,
}

impl ScaleUp {
    pub fn new(
        config: ScaleUpConfig,
        categories: Arc<CategoryTable>,
        auth: Arc<dyn Authenticator>,
        inventory: Arc<dyn RunnerInventory>,
        provisioner: Arc<dyn RunnerProvisioner>,
    ) -> Self {
        Self {
            config,
            categories,
            auth,
            inventory,
            provisioner,
        }
    }

    pub fn config(&self) -> &ScaleUpConfig {
        &self.config
    }

    /// Handle one queued-job event delivered by `event_source`.
    ///
    /// Scope-wide failures (transport, authentication, check-run lookup,
    /// inventory) return `Err`. Failures confined to one category are
    /// recorded in the report and do not stop the remaining categories.
    pub async fn handle(
        &self,
        event_source: &str,
        message: &ActionRequestMessage,
    ) -> ScaleUpResult<ScaleUpReport> {
        let target =
            target::resolve(event_source, message, &self.config, self.auth.as_ref()).await?;

        let status = target
            .client
            .check_run_status(message.id, &message.repository_owner, &message.repository_name)
            .await
            .map_err(ScaleUpError::PlatformApi)?;

        if !status.is_actionable() {
            debug!(
                check_run = message.id,
                repository = %message.repository_full_name(),
                %status,
                "check run not queued, nothing to do"
            );
            return Ok(ScaleUpReport::Skipped { status });
        }

        let records = self
            .inventory
            .list_tracked_runners(&self.config.environment, &target.scope)
            .await?;

        info!(
            check_run = message.id,
            scope = %target.scope,
            tracked = records.len(),
            categories = self.categories.len(),
            "evaluating runner categories"
        );

        let mut outcomes = Vec::with_capacity(self.categories.len());
        for category in self.categories.iter() {
            let outcome = match self
                .evaluate_category(target.client.as_ref(), &target.scope, category, &records)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        scope = %target.scope,
                        category = %category.name,
                        error = %e,
                        "category scale-up failed"
                    );
                    CategoryOutcome::Failed(e)
                }
            };
            outcomes.push((category.name.clone(), outcome));
        }

        Ok(ScaleUpReport::Evaluated {
            scope: target.scope,
            outcomes,
        })
    }

    async fn evaluate_category(
        &self,
        client: &dyn InstallationClient,
        scope: &Scope,
        category: &RunnerCategory,
        records: &[RunnerRecord],
    ) -> ScaleUpResult<CategoryOutcome> {
        let current = records
            .iter()
            .filter(|r| r.category == category.name)
            .count();

        if !category.has_capacity(current) {
            info!(
                %scope,
                category = %category.name,
                current,
                max = category.max_available,
                "category at capacity"
            );
            return Ok(CategoryOutcome::AtCapacity {
                current,
                max: category.max_available,
            });
        }

        let live = client
            .list_live_runners(scope)
            .await
            .map_err(ScaleUpError::PlatformApi)?;
        let admission = Admission::evaluate(&live, &category.name);

        debug!(
            %scope,
            category = %category.name,
            current,
            max = category.max_available,
            matching = admission.matching,
            idle = admission.idle,
            "admission check"
        );

        if !all_matching_busy(&live, &category.name) {
            info!(
                %scope,
                category = %category.name,
                idle = admission.idle,
                "idle runner available, not scaling"
            );
            return Ok(CategoryOutcome::IdleRunnerAvailable {
                idle: admission.idle,
            });
        }

        provision_runner(client, self.provisioner.as_ref(), &self.config, scope, category).await?;
        Ok(CategoryOutcome::Provisioned)
    }
}
