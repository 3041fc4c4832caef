//! Route handlers

mod health;
mod messages;
mod queues;
mod subscribers;

pub use health::health_check;
pub use messages::send_message;
pub use queues::{create_queue, delete_queue, empty_queue, list_queues};
pub use subscribers::{add_subscriber, list_subscribers, remove_subscriber};

use crate::ApiError;

/// Parse a numeric path segment, rejecting anything but a positive integer
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::validation(format!("Invalid {} ID: {}", what, raw)))
}
