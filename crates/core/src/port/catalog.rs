// Catalog Port (Interface)

use crate::domain::{Queue, QueueId, StoreKey, Subscriber, SubscriberId, WorkspaceId};
use crate::error::Result;
use crate::port::CatalogTransaction;
use async_trait::async_trait;

/// Relational bookkeeping of queues and subscribers
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Begin a transaction for queue creation/deletion
    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>>;

    /// Find queue by ID
    async fn find_queue(&self, id: QueueId) -> Result<Option<Queue>>;

    /// Queues of one workspace, oldest first
    async fn list_queues(&self, workspace_id: WorkspaceId) -> Result<Vec<Queue>>;

    /// Store identities of every queue in the system
    async fn list_store_keys(&self) -> Result<Vec<StoreKey>>;

    /// Register a webhook for a queue
    async fn insert_subscriber(&self, queue_id: QueueId, webhook_url: &str) -> Result<Subscriber>;

    /// Subscribers of a queue, oldest first
    async fn list_subscribers(&self, queue_id: QueueId) -> Result<Vec<Subscriber>>;

    /// Remove a subscriber of the given queue; false if no such row
    async fn delete_subscriber(
        &self,
        queue_id: QueueId,
        subscriber_id: SubscriberId,
    ) -> Result<bool>;
}
