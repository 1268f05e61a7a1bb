//! Configuration: environment-driven scale-up policy and the runner
//! category table.
//!
//! Categories live in a TOML file loaded once at start-up:
//!
//! ```toml
//! [[category]]
//! name = "linux.2xlarge"
//! instance_type = "c5.2xlarge"
//! os = "linux"
//! image_filter = "amzn2-ami-hvm-2.0*x86_64-ebs"
//! disk_size = 150
//! min_available = 10
//! max_available = 200
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RunnerCategory;

pub const PUBLIC_WEB_URL: &str = "https://github.com";
pub const PUBLIC_API_URL: &str = "https://api.github.com";

pub const ENV_ORGANIZATION_RUNNERS: &str = "ENABLE_ORGANIZATION_RUNNERS";
pub const ENV_EXTRA_LABELS: &str = "RUNNER_EXTRA_LABELS";
pub const ENV_RUNNER_GROUP: &str = "RUNNER_GROUP_NAME";
pub const ENV_ENVIRONMENT: &str = "ENVIRONMENT";
pub const ENV_ENTERPRISE_URL: &str = "GHES_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse category table: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render category table: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid runner category {name:?}: {reason}")]
    InvalidCategory { name: String, reason: String },
    #[error("duplicate runner category: {0}")]
    DuplicateCategory(String),
}

// ── Scale-up policy ────────────────────────────────────────────────

/// Deployment-wide knobs of the scale-up decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleUpConfig {
    /// Register runners at organization level (default) instead of per repository.
    pub organization_level: bool,
    /// Labels appended after the category name on every runner.
    pub extra_labels: Vec<String>,
    /// Runner group for organization-level runners.
    pub runner_group: Option<String>,
    /// Deployment tag; inventory records and created runners carry it.
    pub environment: String,
    /// GitHub Enterprise Server base URL, e.g. `https://ghe.example.com`.
    pub enterprise_base_url: Option<String>,
}

impl Default for ScaleUpConfig {
    fn default() -> Self {
        Self {
            organization_level: true,
            extra_labels: Vec::new(),
            runner_group: None,
            environment: "default".to_string(),
            enterprise_base_url: None,
        }
    }
}

impl ScaleUpConfig {
    /// Read the policy from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the policy through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let organization_level = match get(ENV_ORGANIZATION_RUNNERS) {
            Some(value) => parse_bool(ENV_ORGANIZATION_RUNNERS, &value)?,
            None => defaults.organization_level,
        };

        let extra_labels = get(ENV_EXTRA_LABELS)
            .map(|raw| split_labels(&raw))
            .unwrap_or_default();

        Ok(Self {
            organization_level,
            extra_labels,
            runner_group: get(ENV_RUNNER_GROUP),
            environment: get(ENV_ENVIRONMENT).unwrap_or(defaults.environment),
            enterprise_base_url: get(ENV_ENTERPRISE_URL)
                .map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    /// Base URL runners register against.
    pub fn web_base_url(&self) -> &str {
        self.enterprise_base_url.as_deref().unwrap_or(PUBLIC_WEB_URL)
    }

    /// REST API endpoint: `<enterprise>/api/v3`, or the public API.
    pub fn api_base_url(&self) -> String {
        match &self.enterprise_base_url {
            Some(base) => format!("{base}/api/v3"),
            None => PUBLIC_API_URL.to_string(),
        }
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}

/// Split a comma-separated label list, dropping blanks.
pub fn split_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Category table ─────────────────────────────────────────────────

/// The configured runner categories, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    #[serde(rename = "category", default)]
    categories: Vec<RunnerCategory>,
}

impl CategoryTable {
    pub fn new(categories: Vec<RunnerCategory>) -> Result<Self, ConfigError> {
        let table = Self { categories };
        table.validate()?;
        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: CategoryTable = toml::from_str(content)?;
        table.validate()?;
        Ok(table)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunnerCategory> {
        self.categories.iter()
    }

    pub fn get(&self, name: &str) -> Option<&RunnerCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Category names become runner labels, so they must survive the
    /// comma-separated `--labels` argument intact.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for category in &self.categories {
            let invalid = |reason: &str| ConfigError::InvalidCategory {
                name: category.name.clone(),
                reason: reason.to_string(),
            };
            if category.name.is_empty() {
                return Err(invalid("name is empty"));
            }
            if category.name.contains(',') || category.name.contains(char::is_whitespace) {
                return Err(invalid("name must not contain commas or whitespace"));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(ConfigError::DuplicateCategory(category.name.clone()));
            }
        }
        Ok(())
    }
}
