//! Event classification and scope resolution.
//!
//! Turns the transport tag and the queued event into the scope of the
//! decision plus an installation-scoped API client.

use tracing::debug;

use runnerscale_core::{
    ActionRequestMessage, Authenticator, InstallationClient, SQS_EVENT_SOURCE, ScaleUpConfig, Scope,
};

use crate::error::{ScaleUpError, ScaleUpResult};

/// Scope of a decision and the client bound to it.
pub struct ResolvedTarget {
    pub scope: Scope,
    pub installation_id: u64,
    pub client: Box<dyn InstallationClient>,
}

/// Validate the event origin and resolve scope and installation client.
///
/// When the message carries no installation id, the app identity looks it
/// up for the organization or repository first.
pub async fn resolve(
    event_source: &str,
    message: &ActionRequestMessage,
    config: &ScaleUpConfig,
    auth: &dyn Authenticator,
) -> ScaleUpResult<ResolvedTarget> {
    if event_source != SQS_EVENT_SOURCE {
        return Err(ScaleUpError::UnsupportedTransport(event_source.to_string()));
    }

    let scope = Scope::for_message(message, config.organization_level);

    let installation_id = if message.needs_installation_lookup() {
        let app = auth
            .app_client()
            .await
            .map_err(ScaleUpError::Authentication)?;
        let id = app
            .installation_id(&scope)
            .await
            .map_err(ScaleUpError::PlatformApi)?;
        debug!(%scope, installation_id = id, "installation resolved");
        id
    } else {
        message.installation_id
    };

    let client = auth
        .installation_client(installation_id)
        .await
        .map_err(ScaleUpError::Authentication)?;

    Ok(ResolvedTarget {
        scope,
        installation_id,
        client,
    })
}
