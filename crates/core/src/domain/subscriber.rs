// Subscriber Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::queue::QueueId;
use serde::{Deserialize, Serialize};

/// Subscriber identifier (catalog-assigned)
pub type SubscriberId = i64;

pub const MAX_WEBHOOK_URL_LEN: usize = 2048;

/// Webhook endpoint registered against a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub queue_id: QueueId,
    pub webhook_url: String,
    pub created_at: i64, // epoch ms
}

/// Fields supplied by a caller registering a subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscriber {
    pub webhook_url: String,
}

impl NewSubscriber {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_webhook_url(&self.webhook_url)
    }
}

/// Accepts absolute `http`/`https` URLs with a non-empty host.
///
/// Only the scheme and authority are checked; full parsing is left to the
/// transport.
pub fn validate_webhook_url(url: &str) -> Result<()> {
    let invalid = |reason: &str| DomainError::InvalidWebhookUrl(format!("{url:?}: {reason}"));

    if url.len() > MAX_WEBHOOK_URL_LEN {
        return Err(DomainError::InvalidWebhookUrl(format!(
            "URL too long (max {} bytes)",
            MAX_WEBHOOK_URL_LEN
        )));
    }
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("contains whitespace or control characters"));
    }

    let lower = url.to_ascii_lowercase();
    let rest = if lower.starts_with("https://") {
        &url["https://".len()..]
    } else if lower.starts_with("http://") {
        &url["http://".len()..]
    } else {
        return Err(invalid("scheme must be http or https"));
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = match host.strip_prefix('[') {
        // IPv6 literal, keep everything up to the closing bracket
        Some(v6) => v6.split(']').next().unwrap_or_default(),
        None => host.split(':').next().unwrap_or_default(),
    };
    if host.is_empty() {
        return Err(invalid("missing host"));
    }

    Ok(())
}
