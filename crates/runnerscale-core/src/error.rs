//! Errors reported by the collaborators the decision engine calls.

use thiserror::Error;

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Failure talking to the CI platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Credentials could not be produced or were rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The API answered with a non-success status.
    #[error("{endpoint} returned {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

/// Failure reading the local runner inventory.
#[derive(Debug, Error)]
#[error("runner inventory unavailable: {0}")]
pub struct InventoryError(pub String);

/// The instance-creation collaborator rejected or failed a request.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("provisioner rejected request: {0}")]
    Rejected(String),

    #[error("provisioner unreachable: {0}")]
    Unavailable(String),
}
