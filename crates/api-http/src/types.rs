//! Request/Response Types

use hookq_core::domain::{MessageId, WorkspaceId};
use serde::{Deserialize, Serialize};

/// POST /queues
pub type CreateQueueRequest = hookq_core::domain::NewQueue;

/// POST /queues/{id}/subscribers
pub type AddSubscriberRequest = hookq_core::domain::NewSubscriber;

/// GET /queues?workspace_id=ID
#[derive(Debug, Deserialize)]
pub struct ListQueuesQuery {
    pub workspace_id: WorkspaceId,
}

/// POST /queues/{id}/messages
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub message_id: MessageId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
