//! Scale-up error types.

use runnerscale_core::{InventoryError, PlatformError, ProvisionError};
use thiserror::Error;

/// Errors that can end a scale-up decision, or one category of it.
#[derive(Debug, Error)]
pub enum ScaleUpError {
    #[error("cannot handle events from {0:?}, only SQS events are supported")]
    UnsupportedTransport(String),

    #[error("authentication failed: {0}")]
    Authentication(#[source] PlatformError),

    #[error("platform API call failed: {0}")]
    PlatformApi(#[source] PlatformError),

    #[error("inventory read failed: {0}")]
    Inventory(#[from] InventoryError),

    #[error("runner creation failed: {0}")]
    Provisioning(#[from] ProvisionError),

    #[error("category {category}: {source}")]
    Category {
        category: String,
        #[source]
        source: Box<ScaleUpError>,
    },
}

pub type ScaleUpResult<T> = Result<T, ScaleUpError>;
