// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Variants map onto the caller-visible taxonomy: validation and domain
/// errors are the caller's fault, `NotFound` is a missing queue, subscriber
/// or message, `Storage`/`Io` are internal failures. Webhook failures are
/// logged by fan-out and never become an `AppError`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for errors that leave state untouched because the target is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::Storage(String)
