//! runnerscale-core — shared vocabulary for the runnerscale crates.
//!
//! Holds the domain types exchanged between the decision engine and its
//! collaborators, the collaborator traits themselves, configuration
//! loading, and the runner configuration string the provisioner hands to
//! a freshly launched runner.

pub mod config;
pub mod error;
pub mod platform;
pub mod runner_config;
pub mod types;

pub use config::{CategoryTable, ConfigError, ScaleUpConfig};
pub use error::{InventoryError, PlatformError, PlatformResult, ProvisionError};
pub use platform::{AppClient, Authenticator, InstallationClient, RunnerInventory, RunnerProvisioner};
pub use runner_config::{RunnerConfig, RunnerConfigError};
pub use types::*;
