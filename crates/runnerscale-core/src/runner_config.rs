//! Runner configuration string.
//!
//! A new runner receives its registration arguments as one string:
//!
//! ```text
//! --url https://github.com/acme --token <token> --labels linux.2xlarge,gpu --runnergroup ci
//! ```
//!
//! `--runnergroup` only ever appears for organization-scoped runners.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::types::{RegistrationToken, Scope};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunnerConfigError {
    #[error("missing required argument --{0}")]
    MissingArgument(&'static str),
    #[error("unknown argument --{0}")]
    UnknownArgument(String),
    #[error("argument --{0} has no value")]
    EmptyValue(String),
    #[error("malformed runner configuration: {0}")]
    Malformed(String),
}

/// Parsed registration arguments for one runner.
#[derive(Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub url: String,
    token: String,
    pub labels: Vec<String>,
    pub runner_group: Option<String>,
}

impl RunnerConfig {
    /// Compose the configuration for a runner of `category` in `scope`.
    ///
    /// Labels are the category name followed by `extra_labels`. A runner
    /// group is only applied to organization scopes.
    pub fn compose(
        base_url: &str,
        scope: &Scope,
        token: &RegistrationToken,
        category: &str,
        extra_labels: &[String],
        runner_group: Option<&str>,
    ) -> Self {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), scope.path());

        let mut labels = Vec::with_capacity(1 + extra_labels.len());
        labels.push(category.to_string());
        labels.extend(extra_labels.iter().cloned());

        let runner_group = match scope {
            Scope::Organization { .. } => runner_group.map(str::to_string),
            Scope::Repository { .. } => None,
        };

        Self {
            url,
            token: token.expose().to_string(),
            labels,
            runner_group,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Display for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "--url {} --token {} --labels {}",
            self.url,
            self.token,
            self.labels.join(",")
        )?;
        if let Some(group) = &self.runner_group {
            write!(f, " --runnergroup {group}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("labels", &self.labels)
            .field("runner_group", &self.runner_group)
            .finish()
    }
}

impl FromStr for RunnerConfig {
    type Err = RunnerConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.starts_with("--") {
            return Err(RunnerConfigError::Malformed(s.to_string()));
        }

        // Flags always appear in rendering order. The group comes last and
        // is taken verbatim, so it may contain spaces or dashes.
        let rest = s
            .strip_prefix("--url ")
            .ok_or(RunnerConfigError::MissingArgument("url"))?;
        let (url, rest) = rest
            .split_once(" --token ")
            .ok_or(RunnerConfigError::MissingArgument("token"))?;
        let (token, rest) = rest
            .split_once(" --labels ")
            .ok_or(RunnerConfigError::MissingArgument("labels"))?;
        let (labels, runner_group) = match rest.split_once(" --runnergroup ") {
            Some((labels, group)) => (labels, Some(group)),
            None => (rest, None),
        };

        if let Some((_, unknown)) = labels.split_once(" --") {
            let flag = unknown.split_whitespace().next().unwrap_or(unknown);
            return Err(RunnerConfigError::UnknownArgument(flag.to_string()));
        }

        Ok(Self {
            url: non_empty("url", url)?,
            token: non_empty("token", token)?,
            labels: non_empty("labels", labels)?
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            runner_group: runner_group
                .map(|g| non_empty("runnergroup", g))
                .transpose()?,
        })
    }
}

fn non_empty(flag: &str, value: &str) -> Result<String, RunnerConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RunnerConfigError::EmptyValue(flag.to_string()));
    }
    Ok(value.to_string())
}

impl Serialize for RunnerConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RunnerConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
