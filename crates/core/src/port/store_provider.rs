// Queue Store Provider Port (Interface)

use crate::domain::StoreKey;
use crate::error::Result;
use crate::port::QueueStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Registry of per-queue stores addressed by `StoreKey`
///
/// Stores are independent: opening, using or destroying one never takes a
/// lock that another queue's store needs.
#[async_trait]
pub trait QueueStoreProvider: Send + Sync {
    /// Create an empty, schema-initialized store (idempotent)
    async fn provision(&self, key: StoreKey) -> Result<Arc<dyn QueueStore>>;

    /// Open an existing store; `NotFound` if it was never provisioned or was destroyed
    async fn open(&self, key: StoreKey) -> Result<Arc<dyn QueueStore>>;

    /// Remove the store and everything it holds; absent stores are not an error
    async fn destroy(&self, key: StoreKey) -> Result<()>;

    /// Keys of every store currently present on disk
    async fn list_provisioned(&self) -> Result<Vec<StoreKey>>;
}
