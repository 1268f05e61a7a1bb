//! Wire shapes of the GitHub REST responses the client reads.
//!
//! Only the fields runnerscale uses are declared; serde ignores the rest.

use serde::Deserialize;

use runnerscale_core::{CheckRunStatus, LiveRunnerStatus, RunnerState};

#[derive(Debug, Deserialize)]
pub struct Installation {
    pub id: u64,
}

/// Installation access token or runner registration token.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub status: CheckRunStatus,
}

#[derive(Debug, Deserialize)]
pub struct RunnerPage {
    pub total_count: usize,
    pub runners: Vec<Runner>,
}

#[derive(Debug, Deserialize)]
pub struct Runner {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub busy: bool,
    #[serde(default)]
    pub labels: Vec<RunnerLabel>,
}

#[derive(Debug, Deserialize)]
pub struct RunnerLabel {
    pub name: String,
}

/// Error body GitHub attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

impl From<Runner> for LiveRunnerStatus {
    fn from(runner: Runner) -> Self {
        // Anything GitHub does not call "offline" can still take jobs.
        let status = if runner.status == "offline" {
            RunnerState::Offline
        } else {
            RunnerState::Online
        };
        LiveRunnerStatus {
            id: runner.id,
            name: runner.name,
            status,
            busy: runner.busy,
            labels: runner.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}
