//! runnerscale-github — GitHub implementations of the platform traits.
//!
//! ```text
//! GithubAuthenticator (app id + private key)
//!   ├── app_client()              → GithubAppClient (app JWT)
//!   │     └── installation_id()   GET /orgs/{org}/installation
//!   │                             GET /repos/{owner}/{repo}/installation
//!   └── installation_client(id)   POST /app/installations/{id}/access_tokens
//!         → GithubInstallationClient (installation token)
//!             ├── check_run_status()           GET  /repos/{o}/{r}/check-runs/{id}
//!             ├── list_live_runners()          GET  /{orgs/{org}|repos/{o}/{r}}/actions/runners
//!             └── create_registration_token()  POST /{orgs/{org}|repos/{o}/{r}}/actions/runners/registration-token
//! ```
//!
//! Works against github.com and GitHub Enterprise Server (`<base>/api/v3`).

pub mod auth;
pub mod client;
pub mod config;
pub mod models;

pub use auth::{GithubAppClient, GithubAuthenticator};
pub use client::GithubInstallationClient;
pub use config::GithubAppConfig;
