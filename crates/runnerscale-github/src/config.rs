//! GitHub App credentials.

use std::fmt;
use std::path::Path;

use runnerscale_core::ConfigError;

pub const ENV_APP_ID: &str = "GITHUB_APP_ID";
pub const ENV_APP_KEY_PATH: &str = "GITHUB_APP_KEY_PATH";
pub const ENV_APP_KEY: &str = "GITHUB_APP_KEY";

/// App id plus the PEM-encoded RSA private key used to sign app JWTs.
#[derive(Clone)]
pub struct GithubAppConfig {
    pub app_id: u64,
    pub private_key_pem: String,
}

impl fmt::Debug for GithubAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubAppConfig")
            .field("app_id", &self.app_id)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

impl GithubAppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// `GITHUB_APP_KEY_PATH` wins over an inline `GITHUB_APP_KEY`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let raw_id = get(ENV_APP_ID).ok_or(ConfigError::Missing(ENV_APP_ID))?;
        let app_id = raw_id
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue {
                var: ENV_APP_ID,
                value: raw_id.clone(),
            })?;

        let private_key_pem = match get(ENV_APP_KEY_PATH) {
            Some(path) => read_key(Path::new(path.trim()))?,
            None => get(ENV_APP_KEY).ok_or(ConfigError::Missing(ENV_APP_KEY_PATH))?,
        };

        Ok(Self {
            app_id,
            private_key_pem,
        })
    }
}

fn read_key(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}
