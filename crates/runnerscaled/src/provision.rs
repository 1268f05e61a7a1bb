//! Runner provisioners the daemon can hand creation requests to.

use async_trait::async_trait;
use tracing::{info, warn};

use runnerscale_core::{ProvisionError, RunnerCreationRequest, RunnerProvisioner};
use runnerscale_github::client::{REQUEST_TIMEOUT, USER_AGENT};

/// POSTs every creation request as JSON to an instance-launching service.
///
/// The body carries the full runner configuration, registration token
/// included; the endpoint must be trusted. The endpoint is also expected
/// to record each launched runner in the inventory; nothing here writes
/// it, and category ceilings count only recorded runners.
pub struct WebhookProvisioner {
    http: reqwest::Client,
    url: String,
}

impl WebhookProvisioner {
    pub fn new(url: impl Into<String>) -> Result<Self, ProvisionError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProvisionError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RunnerProvisioner for WebhookProvisioner {
    async fn create_runner(&self, request: RunnerCreationRequest) -> Result<(), ProvisionError> {
        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProvisionError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!(
                scope = %request.scope,
                category = %request.category.name,
                status = status.as_u16(),
                "runner creation accepted"
            );
            return Ok(());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("error body unreadable: {e}"),
        };
        warn!(
            scope = %request.scope,
            category = %request.category.name,
            status = status.as_u16(),
            "runner creation refused"
        );
        let detail = format!("{status}: {body}");
        if status.is_client_error() {
            Err(ProvisionError::Rejected(detail))
        } else {
            Err(ProvisionError::Unavailable(detail))
        }
    }
}

/// Logs what would be launched and launches nothing.
pub struct DryRunProvisioner;

#[async_trait]
impl RunnerProvisioner for DryRunProvisioner {
    async fn create_runner(&self, request: RunnerCreationRequest) -> Result<(), ProvisionError> {
        info!(
            environment = %request.environment,
            scope = %request.scope,
            category = %request.category.name,
            instance_type = %request.category.instance_type,
            url = %request.runner_config.url,
            labels = %request.runner_config.labels.join(","),
            "dry run: runner not created"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use serde_json::Value;

    use runnerscale_core::{RegistrationToken, RunnerCategory, RunnerConfig, Scope};

    type Received = Arc<Mutex<Vec<Value>>>;

    async fn sink(
        State((received, status)): State<(Received, StatusCode)>,
        body: String,
    ) -> StatusCode {
        received
            .lock()
            .unwrap()
            .push(serde_json::from_str(&body).unwrap());
        status
    }

    async fn serve(status: StatusCode) -> (String, Received) {
        let received: Received = Arc::default();
        let router = Router::new()
            .route("/runners", post(sink))
            .with_state((received.clone(), status));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}/runners"), received)
    }

    fn request() -> RunnerCreationRequest {
        let scope = Scope::Organization {
            org: "acme".to_string(),
        };
        let category = RunnerCategory {
            name: "linux.large".to_string(),
            instance_type: "c5.large".to_string(),
            os: "linux".to_string(),
            image_filter: "amzn2*".to_string(),
            disk_size: 100,
            min_available: 0,
            max_available: 5,
            ephemeral: false,
        };
        let runner_config = RunnerConfig::compose(
            "https://github.com",
            &scope,
            &RegistrationToken::new("AREG"),
            &category.name,
            &[],
            None,
        );
        RunnerCreationRequest {
            environment: "prod".to_string(),
            scope,
            category,
            runner_config,
        }
    }

    #[tokio::test]
    async fn webhook_posts_the_request() {
        let (url, received) = serve(StatusCode::ACCEPTED).await;
        let provisioner = WebhookProvisioner::new(url).unwrap();

        provisioner.create_runner(request()).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["environment"], "prod");
        assert_eq!(received[0]["category"]["name"], "linux.large");
        assert_eq!(
            received[0]["runner_config"],
            "--url https://github.com/acme --token AREG --labels linux.large"
        );
    }

    #[tokio::test]
    async fn client_errors_are_rejections() {
        let (url, _) = serve(StatusCode::UNPROCESSABLE_ENTITY).await;
        let provisioner = WebhookProvisioner::new(url).unwrap();

        let err = provisioner.create_runner(request()).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Rejected(_)));
    }

    #[tokio::test]
    async fn server_errors_are_unavailability() {
        let (url, _) = serve(StatusCode::SERVICE_UNAVAILABLE).await;
        let provisioner = WebhookProvisioner::new(url).unwrap();

        let err = provisioner.create_runner(request()).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Unavailable(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailability() {
        let provisioner = WebhookProvisioner::new("http://127.0.0.1:1/runners").unwrap();
        let err = provisioner.create_runner(request()).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Unavailable(_)));
    }

    /// Consume one full HTTP/1.1 request from `socket`.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        use tokio::io::AsyncReadExt;

        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + body_len {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn unreadable_refusal_body_is_reported() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let _ = socket
                .write_all(b"HTTP/1.1 400 Bad Request\r\ncontent-length: 100\r\n\r\nshort")
                .await;
            let _ = socket.shutdown().await;
        });

        let provisioner = WebhookProvisioner::new(format!("http://{addr}/runners")).unwrap();
        match provisioner.create_runner(request()).await.unwrap_err() {
            ProvisionError::Rejected(detail) => {
                assert!(detail.contains("error body unreadable"), "{detail}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dry_run_accepts_everything() {
        DryRunProvisioner.create_runner(request()).await.unwrap();
    }
}
