//! Installation-scoped REST client and the shared request plumbing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;

use runnerscale_core::{
    CheckRunStatus, InstallationClient, LiveRunnerStatus, PlatformError, PlatformResult,
    RegistrationToken, Scope,
};

use crate::models::{ApiErrorBody, CheckRun, RunnerPage, TokenResponse};

pub const USER_AGENT: &str = concat!("runnerscale/", env!("CARGO_PKG_VERSION"));
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const API_VERSION: &str = "2022-11-28";
const RUNNERS_PER_PAGE: usize = 100;

/// Build the HTTP client shared by every GitHub call.
pub fn http_client() -> PlatformResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| PlatformError::Transport {
            endpoint: "client".to_string(),
            message: e.to_string(),
        })
}

/// REST base URL plus one bearer credential.
#[derive(Clone)]
pub(crate) struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer: String,
}

impl ApiClient {
    pub(crate) fn new(http: reqwest::Client, base_url: &str, bearer: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer,
        }
    }

    pub(crate) fn with_bearer(&self, bearer: String) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            bearer,
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> PlatformResult<T> {
        self.send(Method::GET, path, query).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(&self, path: &str) -> PlatformResult<T> {
        self.send(Method::POST, path, &[]).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> PlatformResult<T> {
        let url = format!("{}{path}", self.base_url);
        let transport = |e: reqwest::Error| PlatformError::Transport {
            endpoint: path.to_string(),
            message: e.to_string(),
        };

        let response = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.bearer)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        debug!(%method, %path, status = status.as_u16(), "github api call");

        if !status.is_success() {
            let message = match response.text().await {
                Ok(body) => serde_json::from_str::<ApiErrorBody>(&body)
                    .map(|b| b.message)
                    .unwrap_or(body),
                Err(e) => format!("error body unreadable: {e}"),
            };
            return Err(PlatformError::Api {
                endpoint: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(|e| PlatformError::Decode {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// `/orgs/{org}` or `/repos/{owner}/{repo}`.
pub(crate) fn scope_path(scope: &Scope) -> String {
    match scope {
        Scope::Organization { org } => format!("/orgs/{org}"),
        Scope::Repository { owner, repo } => format!("/repos/{owner}/{repo}"),
    }
}

/// Client acting on behalf of one app installation.
pub struct GithubInstallationClient {
    api: ApiClient,
    installation_id: u64,
}

impl GithubInstallationClient {
    pub(crate) fn new(api: ApiClient, installation_id: u64) -> Self {
        Self {
            api,
            installation_id,
        }
    }

    pub fn installation_id(&self) -> u64 {
        self.installation_id
    }
}

#[async_trait]
impl InstallationClient for GithubInstallationClient {
    async fn check_run_status(
        &self,
        check_run_id: u64,
        owner: &str,
        repo: &str,
    ) -> PlatformResult<CheckRunStatus> {
        let path = format!("/repos/{owner}/{repo}/check-runs/{check_run_id}");
        let run: CheckRun = self.api.get(&path, &[]).await?;
        debug!(check_run = run.id, status = %run.status, "check run fetched");
        Ok(run.status)
    }

    async fn list_live_runners(&self, scope: &Scope) -> PlatformResult<Vec<LiveRunnerStatus>> {
        let path = format!("{}/actions/runners", scope_path(scope));
        let mut runners = Vec::new();
        let mut page = 1u32;

        loop {
            let query = [
                ("per_page", RUNNERS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let batch: RunnerPage = self.api.get(&path, &query).await?;
            let fetched = batch.runners.len();
            runners.extend(batch.runners.into_iter().map(LiveRunnerStatus::from));

            if fetched < RUNNERS_PER_PAGE || runners.len() >= batch.total_count {
                break;
            }
            page += 1;
        }

        debug!(%scope, runners = runners.len(), pages = page, "live runners listed");
        Ok(runners)
    }

    async fn create_registration_token(&self, scope: &Scope) -> PlatformResult<RegistrationToken> {
        let path = format!("{}/actions/runners/registration-token", scope_path(scope));
        let response: TokenResponse = self.api.post(&path).await?;
        debug!(
            %scope,
            expires_at = response.expires_at.as_deref().unwrap_or("unknown"),
            "registration token issued"
        );
        Ok(RegistrationToken::new(response.token))
    }
}
