//! HTTP API Layer
//!
//! JSON management surface over `QueueService`: queues, subscribers and
//! message submission.

pub mod error;
pub mod handlers;
pub mod server;
pub mod types;

use hookq_core::application::QueueService;
use std::sync::Arc;

pub use error::ApiError;
pub use server::{create_router, serve};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueueService>,
}

impl AppState {
    pub fn new(service: Arc<QueueService>) -> Self {
        Self { service }
    }
}
