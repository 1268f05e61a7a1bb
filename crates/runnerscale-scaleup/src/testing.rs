//! Recording fakes of the engine's collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use runnerscale_core::*;

/// One observed collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AppClient,
    InstallationLookup(Scope),
    InstallationClient(u64),
    CheckRun { id: u64, owner: String, repo: String },
    ListLiveRunners(Scope),
    RegistrationToken(Scope),
    ListTracked { environment: String, scope: Scope },
    CreateRunner(RunnerCreationRequest),
}

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(*c)).count()
    }

    pub fn created(&self) -> Vec<RunnerCreationRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateRunner(req) => Some(req),
                _ => None,
            })
            .collect()
    }
}

/// Scripted answers of the fake CI platform.
#[derive(Clone)]
pub struct PlatformScript {
    pub installation_id: u64,
    pub status: CheckRunStatus,
    pub live_runners: Vec<LiveRunnerStatus>,
    pub fail_app_auth: bool,
    pub fail_check_run: bool,
    pub fail_live_runners: bool,
    pub fail_token: bool,
}

impl Default for PlatformScript {
    fn default() -> Self {
        Self {
            installation_id: 4242,
            status: CheckRunStatus::Queued,
            live_runners: Vec::new(),
            fail_app_auth: false,
            fail_check_run: false,
            fail_live_runners: false,
            fail_token: false,
        }
    }
}

#[derive(Clone)]
pub struct FakePlatform {
    script: Arc<PlatformScript>,
    log: CallLog,
    tokens_issued: Arc<Mutex<u32>>,
}

impl FakePlatform {
    pub fn new(script: PlatformScript, log: CallLog) -> Self {
        Self {
            script: Arc::new(script),
            log,
            tokens_issued: Arc::new(Mutex::new(0)),
        }
    }
}

fn api_error(endpoint: &str) -> PlatformError {
    PlatformError::Api {
        endpoint: endpoint.to_string(),
        status: 500,
        message: "scripted failure".to_string(),
    }
}

#[async_trait]
impl Authenticator for FakePlatform {
    async fn app_client(&self) -> PlatformResult<Box<dyn AppClient>> {
        self.log.push(Call::AppClient);
        if self.script.fail_app_auth {
            return Err(PlatformError::Auth("bad app key".to_string()));
        }
        Ok(Box::new(self.clone()))
    }

    async fn installation_client(
        &self,
        installation_id: u64,
    ) -> PlatformResult<Box<dyn InstallationClient>> {
        self.log.push(Call::InstallationClient(installation_id));
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl AppClient for FakePlatform {
    async fn installation_id(&self, scope: &Scope) -> PlatformResult<u64> {
        self.log.push(Call::InstallationLookup(scope.clone()));
        Ok(self.script.installation_id)
    }
}

#[async_trait]
impl InstallationClient for FakePlatform {
    async fn check_run_status(
        &self,
        check_run_id: u64,
        owner: &str,
        repo: &str,
    ) -> PlatformResult<CheckRunStatus> {
        self.log.push(Call::CheckRun {
            id: check_run_id,
            owner: owner.to_string(),
            repo: repo.to_string(),
        });
        if self.script.fail_check_run {
            return Err(api_error("check-runs"));
        }
        Ok(self.script.status)
    }

    async fn list_live_runners(&self, scope: &Scope) -> PlatformResult<Vec<LiveRunnerStatus>> {
        self.log.push(Call::ListLiveRunners(scope.clone()));
        if self.script.fail_live_runners {
            return Err(api_error("actions/runners"));
        }
        Ok(self.script.live_runners.clone())
    }

    async fn create_registration_token(&self, scope: &Scope) -> PlatformResult<RegistrationToken> {
        self.log.push(Call::RegistrationToken(scope.clone()));
        if self.script.fail_token {
            return Err(api_error("registration-token"));
        }
        let mut issued = self.tokens_issued.lock().unwrap();
        *issued += 1;
        Ok(RegistrationToken::new(format!("TOKEN-{issued}")))
    }
}

pub struct FakeInventory {
    pub records: Vec<RunnerRecord>,
    pub fail: bool,
    pub log: CallLog,
}

#[async_trait]
impl RunnerInventory for FakeInventory {
    async fn list_tracked_runners(
        &self,
        environment: &str,
        scope: &Scope,
    ) -> Result<Vec<RunnerRecord>, InventoryError> {
        self.log.push(Call::ListTracked {
            environment: environment.to_string(),
            scope: scope.clone(),
        });
        if self.fail {
            return Err(InventoryError("store offline".to_string()));
        }
        Ok(self.records.clone())
    }
}

pub struct FakeProvisioner {
    /// Categories whose creation requests are rejected.
    pub reject: Vec<String>,
    pub log: CallLog,
}

#[async_trait]
impl RunnerProvisioner for FakeProvisioner {
    async fn create_runner(&self, request: RunnerCreationRequest) -> Result<(), ProvisionError> {
        let rejected = self.reject.contains(&request.category.name);
        let name = request.category.name.clone();
        self.log.push(Call::CreateRunner(request));
        if rejected {
            return Err(ProvisionError::Rejected(format!("no capacity for {name}")));
        }
        Ok(())
    }
}

pub fn message(installation_id: u64) -> ActionRequestMessage {
    ActionRequestMessage {
        id: 1001,
        event_type: "check_run".to_string(),
        repository_name: "widgets".to_string(),
        repository_owner: "acme".to_string(),
        installation_id,
    }
}

pub fn category(name: &str, max_available: u32) -> RunnerCategory {
    RunnerCategory {
        name: name.to_string(),
        instance_type: "c5.2xlarge".to_string(),
        os: "linux".to_string(),
        image_filter: "amzn2-ami-hvm-2.0*x86_64-ebs".to_string(),
        disk_size: 150,
        min_available: 0,
        max_available,
        ephemeral: false,
    }
}

pub fn tracked(count: usize, category: &str, scope: &Scope) -> Vec<RunnerRecord> {
    (0..count)
        .map(|i| RunnerRecord {
            instance_id: format!("i-{category}-{i}"),
            environment: "default".to_string(),
            scope: scope.clone(),
            category: category.to_string(),
            launch_time: 1_700_000_000,
        })
        .collect()
}

pub fn live(id: u64, label: &str, busy: bool) -> LiveRunnerStatus {
    LiveRunnerStatus {
        id,
        name: format!("runner-{id}"),
        status: RunnerState::Online,
        busy,
        labels: vec!["self-hosted".to_string(), label.to_string()],
    }
}
