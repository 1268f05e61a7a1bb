//! Domain types shared across runnerscale crates.
//!
//! Everything here is constructed fresh for one scale-up decision and
//! dropped at the end of it. Types that cross a process boundary (the
//! queued event, inventory records, provisioning requests) are serde
//! serializable.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::runner_config::RunnerConfig;

/// Event-source tag of the only transport the engine accepts.
pub const SQS_EVENT_SOURCE: &str = "aws:sqs";

/// Installation id value meaning "not known by the producer, look it up".
pub const UNRESOLVED_INSTALLATION: u64 = 0;

// ── Triggering event ───────────────────────────────────────────────

/// A "job queued" event forwarded by the webhook ingestion stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequestMessage {
    /// Check-run id of the queued job.
    pub id: u64,
    pub event_type: String,
    pub repository_name: String,
    pub repository_owner: String,
    /// GitHub App installation id; `0` when the producer did not know it.
    #[serde(default)]
    pub installation_id: u64,
}

impl ActionRequestMessage {
    /// `owner/repo`.
    pub fn repository_full_name(&self) -> String {
        format!("{}/{}", self.repository_owner, self.repository_name)
    }

    pub fn needs_installation_lookup(&self) -> bool {
        self.installation_id == UNRESOLVED_INSTALLATION
    }
}

// ── Scope ──────────────────────────────────────────────────────────

/// The target a decision and all of its API calls are bound to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    Organization { org: String },
    Repository { owner: String, repo: String },
}

impl Scope {
    /// Resolve the scope of an event under the organization-level policy.
    pub fn for_message(message: &ActionRequestMessage, organization_level: bool) -> Self {
        if organization_level {
            Scope::Organization {
                org: message.repository_owner.clone(),
            }
        } else {
            Scope::Repository {
                owner: message.repository_owner.clone(),
                repo: message.repository_name.clone(),
            }
        }
    }

    /// Path segment used both in runner URLs and inventory keys:
    /// `acme` or `acme/widgets`.
    pub fn path(&self) -> String {
        match self {
            Scope::Organization { org } => org.clone(),
            Scope::Repository { owner, repo } => format!("{owner}/{repo}"),
        }
    }

    /// Stable key prefix distinguishing org and repo scopes with the same owner.
    pub fn storage_key(&self) -> String {
        match self {
            Scope::Organization { org } => format!("org/{org}"),
            Scope::Repository { owner, repo } => format!("repo/{owner}/{repo}"),
        }
    }

    pub fn is_organization(&self) -> bool {
        matches!(self, Scope::Organization { .. })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Organization { org } => write!(f, "org:{org}"),
            Scope::Repository { owner, repo } => write!(f, "repo:{owner}/{repo}"),
        }
    }
}

// ── Runner categories ──────────────────────────────────────────────

/// One class of runner with its own machine profile and capacity bounds.
///
/// `name` doubles as the label the runner registers with, so jobs that
/// ask for `runs-on: linux.2xlarge` land on runners of this category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerCategory {
    pub name: String,
    /// Compute profile, e.g. `c5.2xlarge`.
    pub instance_type: String,
    pub os: String,
    /// Filter used by the provisioner to pick a base image.
    pub image_filter: String,
    /// Root volume size in GiB.
    pub disk_size: u32,
    /// Warm floor maintained elsewhere in the pipeline; not enforced here.
    #[serde(default)]
    pub min_available: u32,
    /// Hard ceiling on tracked runners of this category.
    pub max_available: u32,
    #[serde(default)]
    pub ephemeral: bool,
}

impl RunnerCategory {
    /// Whether `current_count` runners still leave room for one more.
    pub fn has_capacity(&self, current_count: usize) -> bool {
        current_count < self.max_available as usize
    }
}

// ── Fleet ──────────────────────────────────────────────────────────

/// A runner tracked in the local inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerRecord {
    pub instance_id: String,
    pub environment: String,
    pub scope: Scope,
    /// Name of the [`RunnerCategory`] the runner was launched for.
    pub category: String,
    /// Unix timestamp (seconds) of the launch.
    pub launch_time: u64,
}

impl RunnerRecord {
    /// Composite table key: `{environment}:{scope_key}:{instance_id}`.
    pub fn table_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.environment,
            self.scope.storage_key(),
            self.instance_id
        )
    }
}

/// Connection state the CI platform reports for a self-hosted runner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    Online,
    Offline,
}

/// A runner as the CI platform currently sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveRunnerStatus {
    pub id: u64,
    pub name: String,
    pub status: RunnerState,
    pub busy: bool,
    pub labels: Vec<String>,
}

impl LiveRunnerStatus {
    pub fn carries_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn is_offline(&self) -> bool {
        self.status == RunnerState::Offline
    }
}

// ── Check runs ─────────────────────────────────────────────────────

/// Lifecycle status of a check run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunStatus {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Requested,
    Pending,
    #[serde(other)]
    Unknown,
}

impl CheckRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckRunStatus::Queued => "queued",
            CheckRunStatus::InProgress => "in_progress",
            CheckRunStatus::Completed => "completed",
            CheckRunStatus::Waiting => "waiting",
            CheckRunStatus::Requested => "requested",
            CheckRunStatus::Pending => "pending",
            CheckRunStatus::Unknown => "unknown",
        }
    }

    /// Only queued check runs can still be picked up by a new runner.
    pub fn is_actionable(&self) -> bool {
        matches!(self, CheckRunStatus::Queued)
    }
}

impl fmt::Display for CheckRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Provisioning ───────────────────────────────────────────────────

/// Single-use secret a new runner registers itself with.
///
/// Deliberately neither `Clone` nor `Display`; `Debug` is redacted.
pub struct RegistrationToken(String);

impl RegistrationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for composing the runner configuration only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RegistrationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RegistrationToken(<redacted>)")
    }
}

/// Everything the provisioner needs to launch one runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerCreationRequest {
    pub environment: String,
    pub scope: Scope,
    pub category: RunnerCategory,
    pub runner_config: RunnerConfig,
}
