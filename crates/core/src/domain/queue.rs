// Queue Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Queue identifier (catalog-assigned)
pub type QueueId = i64;

/// Workspace identifier (tenant scope for queues)
pub type WorkspaceId = i64;

pub const MAX_QUEUE_NAME_LEN: usize = 128;
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// Queue row as stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: String,
    /// Stored verbatim; nothing in the engine interprets it
    pub cron: Option<String>,
    pub created_at: i64, // epoch ms
}

impl Queue {
    pub fn store_key(&self) -> StoreKey {
        StoreKey::new(self.workspace_id, self.id)
    }
}

/// Fields supplied by a caller creating a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQueue {
    pub workspace_id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cron: Option<String>,
}

impl NewQueue {
    pub fn new(workspace_id: WorkspaceId, name: impl Into<String>) -> Self {
        Self {
            workspace_id,
            name: name.into(),
            description: String::new(),
            cron: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workspace_id <= 0 {
            return Err(DomainError::InvalidWorkspace(self.workspace_id));
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidQueueName(
                "name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_QUEUE_NAME_LEN {
            return Err(DomainError::InvalidQueueName(format!(
                "name too long (max {} chars)",
                MAX_QUEUE_NAME_LEN
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(DomainError::InvalidQueueName(
                "name contains control characters".to_string(),
            ));
        }

        let len = self.description.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            return Err(DomainError::DescriptionTooLong {
                len,
                max: MAX_DESCRIPTION_LEN,
            });
        }

        Ok(())
    }
}

/// Deterministic identity of a queue's durable store.
///
/// Any process holding these two ids can locate the store without asking the
/// catalog, which is what lets the dispatcher open stores on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    pub workspace_id: WorkspaceId,
    pub queue_id: QueueId,
}

impl StoreKey {
    pub fn new(workspace_id: WorkspaceId, queue_id: QueueId) -> Self {
        Self {
            workspace_id,
            queue_id,
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workspace_id, self.queue_id)
    }
}

impl From<&Queue> for StoreKey {
    fn from(queue: &Queue) -> Self {
        queue.store_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ok() {
        let q = NewQueue::new(1, "orders").with_description("order events");
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let q = NewQueue::new(1, "   ");
        let err = q.validate().unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_validate_rejects_long_name() {
        let q = NewQueue::new(1, "a".repeat(MAX_QUEUE_NAME_LEN + 1));
        assert!(matches!(
            q.validate(),
            Err(DomainError::InvalidQueueName(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_workspace() {
        assert_eq!(
            NewQueue::new(0, "q").validate(),
            Err(DomainError::InvalidWorkspace(0))
        );
        assert_eq!(
            NewQueue::new(-3, "q").validate(),
            Err(DomainError::InvalidWorkspace(-3))
        );
    }

    #[test]
    fn test_validate_rejects_long_description() {
        let q = NewQueue::new(1, "q").with_description("x".repeat(MAX_DESCRIPTION_LEN + 1));
        assert!(matches!(
            q.validate(),
            Err(DomainError::DescriptionTooLong { .. })
        ));
    }

    #[test]
    fn test_new_queue_defaults_from_json() {
        let q: NewQueue = serde_json::from_str(r#"{"workspace_id": 4, "name": "q"}"#).unwrap();
        assert_eq!(q.description, "");
        assert_eq!(q.cron, None);
    }

    #[test]
    fn test_store_key_display() {
        assert_eq!(StoreKey::new(7, 42).to_string(), "7/42");
    }
}
