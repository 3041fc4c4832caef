// Transaction port for atomic catalog operations

use crate::domain::{NewQueue, Queue, QueueId};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Catalog operations that must commit or roll back together with store
/// provisioning
#[async_trait]
pub trait CatalogTransaction: Transaction {
    /// Insert queue row (within transaction), returning it with its assigned id
    async fn insert_queue(&mut self, queue: &NewQueue) -> Result<Queue>;

    /// Find queue row (within transaction)
    async fn find_queue(&mut self, id: QueueId) -> Result<Option<Queue>>;

    /// Delete queue row and, by cascade, its subscribers (within transaction)
    async fn delete_queue(&mut self, id: QueueId) -> Result<bool>;
}
