//! GitHub App authentication.
//!
//! The app signs a short-lived JWT with its private key. That JWT can look
//! up installations and exchange an installation id for an installation
//! access token, which every other call uses.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use runnerscale_core::{
    AppClient, Authenticator, InstallationClient, PlatformError, PlatformResult, Scope,
};

use crate::client::{ApiClient, GithubInstallationClient, http_client, scope_path};
use crate::config::GithubAppConfig;
use crate::models::{Installation, TokenResponse};

/// GitHub rejects app JWTs living longer than ten minutes.
const JWT_LIFETIME_SECS: u64 = 540;
/// Backdate `iat` to tolerate clock drift.
const JWT_CLOCK_SKEW_SECS: u64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct AppClaims {
    iat: u64,
    exp: u64,
    iss: String,
}

/// Produces app and installation clients for one GitHub App.
pub struct GithubAuthenticator {
    api: ApiClient,
    app_id: u64,
    key: EncodingKey,
    algorithm: Algorithm,
}

impl GithubAuthenticator {
    /// Authenticator signing RS256 JWTs with the app's private key.
    pub fn new(api_url: &str, app: &GithubAppConfig) -> PlatformResult<Self> {
        let key = EncodingKey::from_rsa_pem(app.private_key_pem.as_bytes())
            .map_err(|e| PlatformError::Auth(format!("invalid app private key: {e}")))?;
        Self::with_signing_key(api_url, app.app_id, key, Algorithm::RS256)
    }

    /// Authenticator with an explicit signing key and algorithm.
    pub fn with_signing_key(
        api_url: &str,
        app_id: u64,
        key: EncodingKey,
        algorithm: Algorithm,
    ) -> PlatformResult<Self> {
        Ok(Self {
            api: ApiClient::new(http_client()?, api_url, String::new()),
            app_id,
            key,
            algorithm,
        })
    }

    fn app_jwt(&self) -> PlatformResult<String> {
        let now = epoch_secs();
        let claims = AppClaims {
            iat: now.saturating_sub(JWT_CLOCK_SKEW_SECS),
            exp: now + JWT_LIFETIME_SECS,
            iss: self.app_id.to_string(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.key)
            .map_err(|e| PlatformError::Auth(format!("failed to sign app token: {e}")))
    }

    fn app_api(&self) -> PlatformResult<ApiClient> {
        Ok(self.api.with_bearer(self.app_jwt()?))
    }
}

#[async_trait]
impl Authenticator for GithubAuthenticator {
    async fn app_client(&self) -> PlatformResult<Box<dyn AppClient>> {
        Ok(Box::new(GithubAppClient {
            api: self.app_api()?,
        }))
    }

    async fn installation_client(
        &self,
        installation_id: u64,
    ) -> PlatformResult<Box<dyn InstallationClient>> {
        let path = format!("/app/installations/{installation_id}/access_tokens");
        let response: TokenResponse = self.app_api()?.post(&path).await?;
        debug!(
            installation_id,
            expires_at = response.expires_at.as_deref().unwrap_or("unknown"),
            "installation token issued"
        );
        Ok(Box::new(GithubInstallationClient::new(
            self.api.with_bearer(response.token),
            installation_id,
        )))
    }
}

/// Client authenticated as the app itself.
pub struct GithubAppClient {
    api: ApiClient,
}

#[async_trait]
impl AppClient for GithubAppClient {
    async fn installation_id(&self, scope: &Scope) -> PlatformResult<u64> {
        let path = format!("{}/installation", scope_path(scope));
        let installation: Installation = self.api.get(&path, &[]).await?;
        Ok(installation.id)
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
