// reqwest-backed WebhookNotifier

use async_trait::async_trait;
use hookq_core::port::{DeliveryError, DeliveryReceipt, DeliveryRequest, WebhookNotifier};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use std::time::{Duration, Instant};
use tracing::debug;

pub const QUEUE_ID_HEADER: &str = "X-Hookq-Queue-Id";
pub const MESSAGE_ID_HEADER: &str = "X-Hookq-Message-Id";

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Per-request timeout; `None` leaves the transport default (no timeout)
    pub timeout: Option<Duration>,
    pub user_agent: String,
    pub content_type: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: format!("hookq/{}", hookq_core::VERSION),
            content_type: "application/json".to_string(),
        }
    }
}

/// Delivers message bodies as HTTP POSTs.
///
/// One attempt per call: a non-2xx status is reported as
/// `DeliveryError::Rejected`, nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpWebhookNotifier {
    client: reqwest::Client,
    config: NotifierConfig,
}

impl HttpWebhookNotifier {
    pub fn new(config: NotifierConfig) -> Result<Self, DeliveryError> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            DeliveryError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, DeliveryError> {
        Self::new(NotifierConfig::default())
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }
}

#[async_trait]
impl WebhookNotifier for HttpWebhookNotifier {
    async fn deliver(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, DeliveryError> {
        let started = Instant::now();

        let response = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, &self.config.content_type)
            .header(USER_AGENT, &self.config.user_agent)
            .header(QUEUE_ID_HEADER, request.queue_id.to_string())
            .header(MESSAGE_ID_HEADER, request.message_id.to_string())
            .body(request.body.clone())
            .send()
            .await
            .map_err(categorize)?;

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = response.status();
        debug!(
            url = %request.url,
            status = status.as_u16(),
            duration_ms,
            "Received webhook response"
        );

        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(DeliveryReceipt {
            status: status.as_u16(),
            duration_ms,
        })
    }
}

fn categorize(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::Timeout
    } else if err.is_builder() {
        DeliveryError::Configuration(err.to_string())
    } else if err.is_connect() {
        DeliveryError::Transport(format!("connection failed: {err}"))
    } else {
        DeliveryError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(url: String, body: &'static str) -> DeliveryRequest {
        DeliveryRequest {
            url,
            queue_id: 12,
            message_id: 34,
            body: Bytes::from(body),
        }
    }

    #[tokio::test]
    async fn test_deliver_posts_raw_body_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("content-type", "application/json"))
            .and(header(QUEUE_ID_HEADER, "12"))
            .and(header(MESSAGE_ID_HEADER, "34"))
            .and(body_bytes(b"{\"k\":1}".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = HttpWebhookNotifier::with_defaults().unwrap();
        let receipt = notifier
            .deliver(&request(format!("{}/hook", server.uri()), "{\"k\":1}"))
            .await
            .unwrap();
        assert_eq!(receipt.status, 200);
    }

    #[tokio::test]
    async fn test_non_2xx_is_rejected_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = HttpWebhookNotifier::with_defaults().unwrap();
        let err = notifier
            .deliver(&request(server.uri(), "x"))
            .await
            .unwrap_err();
        assert_eq!(err, DeliveryError::Rejected { status: 503 });
    }

    #[tokio::test]
    async fn test_configured_timeout_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let notifier = HttpWebhookNotifier::new(NotifierConfig {
            timeout: Some(Duration::from_millis(100)),
            ..NotifierConfig::default()
        })
        .unwrap();
        let err = notifier
            .deliver(&request(server.uri(), "x"))
            .await
            .unwrap_err();
        assert_eq!(err, DeliveryError::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let notifier = HttpWebhookNotifier::with_defaults().unwrap();
        // Port 9 (discard) on loopback is closed in test environments
        let err = notifier
            .deliver(&request("http://127.0.0.1:9/hook".to_string(), "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }
}
