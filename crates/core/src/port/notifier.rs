// Webhook Notifier Port
// Abstraction over the transport that carries one message to one subscriber

use crate::domain::{MessageId, QueueId};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// One delivery attempt of one message to one endpoint
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub url: String,
    pub queue_id: QueueId,
    pub message_id: MessageId,
    pub body: Bytes,
}

/// Outcome of an attempt the endpoint accepted (2xx)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub duration_ms: u64,
}

/// Why an attempt failed. Logged by fan-out, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("endpoint returned non-2xx status {status}")]
    Rejected { status: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid delivery configuration: {0}")]
    Configuration(String),
}

/// Webhook notifier interface
#[async_trait]
pub trait WebhookNotifier: Send + Sync {
    /// Make exactly one attempt to deliver `request.body` to `request.url`
    async fn deliver(
        &self,
        request: &DeliveryRequest,
    ) -> std::result::Result<DeliveryReceipt, DeliveryError>;
}

/// Mock implementations for testing
pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every attempt; URLs listed as failing get `Rejected { status: 500 }`.
    /// URLs listed as hanging never answer and are not recorded.
    #[derive(Default)]
    pub struct RecordingNotifier {
        attempts: Mutex<Vec<DeliveryRequest>>,
        failing: Mutex<HashSet<String>>,
        hanging: Mutex<HashSet<String>>,
        latency: Option<Duration>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every attempt sleeps for `latency` before answering
        pub fn with_latency(latency: Duration) -> Self {
            Self {
                latency: Some(latency),
                ..Self::default()
            }
        }

        pub fn fail_url(&self, url: impl Into<String>) {
            self.failing
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(url.into());
        }

        pub fn hang_url(&self, url: impl Into<String>) {
            self.hanging
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(url.into());
        }

        pub fn attempts(&self) -> Vec<DeliveryRequest> {
            self.attempts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }

        pub fn attempt_count(&self) -> usize {
            self.attempts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .len()
        }

        pub fn attempts_for(&self, url: &str) -> usize {
            self.attempts()
                .iter()
                .filter(|request| request.url == url)
                .count()
        }
    }

    #[async_trait]
    impl WebhookNotifier for RecordingNotifier {
        async fn deliver(
            &self,
            request: &DeliveryRequest,
        ) -> std::result::Result<DeliveryReceipt, DeliveryError> {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            let hanging = self
                .hanging
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .contains(&request.url);
            if hanging {
                std::future::pending::<()>().await;
            }

            self.attempts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(request.clone());

            let failing = self
                .failing
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .contains(&request.url);
            if failing {
                Err(DeliveryError::Rejected { status: 500 })
            } else {
                Ok(DeliveryReceipt {
                    status: 200,
                    duration_ms: 0,
                })
            }
        }
    }
}
