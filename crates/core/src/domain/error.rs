// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid workspace id: {0} (must be positive)")]
    InvalidWorkspace(i64),

    #[error("Invalid queue name: {0}")]
    InvalidQueueName(String),

    #[error("Description too long: {len} chars (max {max})")]
    DescriptionTooLong { len: usize, max: usize },

    #[error("Invalid webhook URL: {0}")]
    InvalidWebhookUrl(String),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Delay too long: {delay_ms}ms (max {max_ms}ms)")]
    DelayTooLong { delay_ms: u64, max_ms: u64 },
}

pub type Result<T> = std::result::Result<T, DomainError>;
