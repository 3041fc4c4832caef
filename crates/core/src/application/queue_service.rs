// Queue Service - queue, subscriber and message use cases
//
// Owns the ordering rules between the catalog and the per-queue stores:
// a queue row only exists once its store is provisioned, and a store is
// only destroyed after its row is gone.

use crate::domain::message::{validate_body, validate_delay};
use crate::domain::{
    MessageId, NewQueue, NewSubscriber, Queue, QueueId, StoreKey, Subscriber, SubscriberId,
    WorkspaceId,
};
use crate::error::{AppError, Result};
use crate::port::{Catalog, QueueStore, QueueStoreProvider};
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct QueueService {
    catalog: Arc<dyn Catalog>,
    stores: Arc<dyn QueueStoreProvider>,
}

impl QueueService {
    pub fn new(catalog: Arc<dyn Catalog>, stores: Arc<dyn QueueStoreProvider>) -> Self {
        Self { catalog, stores }
    }

    /// Create a queue and provision its store.
    ///
    /// The row is inserted inside a transaction that only commits once the
    /// store exists, so a provisioning failure leaves no catalog entry.
    pub async fn create_queue(&self, new_queue: NewQueue) -> Result<Queue> {
        new_queue.validate()?;
        let new_queue = NewQueue {
            name: new_queue.name.trim().to_string(),
            ..new_queue
        };

        let mut tx = self.catalog.begin().await?;
        let queue = tx.insert_queue(&new_queue).await?;

        if let Err(e) = self.stores.provision(queue.store_key()).await {
            warn!(
                queue_id = queue.id,
                workspace_id = queue.workspace_id,
                error = %e,
                "Store provisioning failed, rolling back queue creation"
            );
            tx.rollback().await?;
            return Err(e);
        }

        tx.commit().await?;

        info!(
            queue_id = queue.id,
            workspace_id = queue.workspace_id,
            name = %queue.name,
            "Queue created"
        );
        Ok(queue)
    }

    pub async fn list_queues(&self, workspace_id: WorkspaceId) -> Result<Vec<Queue>> {
        self.catalog.list_queues(workspace_id).await
    }

    pub async fn get_queue(&self, queue_id: QueueId) -> Result<Queue> {
        self.catalog
            .find_queue(queue_id)
            .await?
            .ok_or_else(|| queue_not_found(queue_id))
    }

    /// Delete a queue's row, then its store.
    ///
    /// If destroying the store fails the row is already gone; the caller gets
    /// a storage error and the orphaned file is removed by
    /// `reap_orphaned_stores` on the next start.
    pub async fn delete_queue(&self, queue_id: QueueId) -> Result<()> {
        let mut tx = self.catalog.begin().await?;
        let Some(queue) = tx.find_queue(queue_id).await? else {
            tx.rollback().await?;
            return Err(queue_not_found(queue_id));
        };
        tx.delete_queue(queue_id).await?;
        tx.commit().await?;

        let key = queue.store_key();
        if let Err(e) = self.stores.destroy(key).await {
            warn!(
                queue_id,
                workspace_id = queue.workspace_id,
                error = %e,
                "Queue row deleted but store removal failed, store is orphaned"
            );
            return Err(e);
        }

        info!(queue_id, workspace_id = queue.workspace_id, "Queue deleted");
        Ok(())
    }

    /// Remove every currently visible message from a queue
    ///
    /// # Returns
    /// Number of messages removed
    pub async fn empty_queue(&self, queue_id: QueueId) -> Result<u64> {
        let store = self.open_store(queue_id).await?;
        let drained = store.drain_all().await?;
        info!(queue_id, drained, "Queue emptied");
        Ok(drained)
    }

    pub async fn send_message(
        &self,
        queue_id: QueueId,
        body: Bytes,
        delay: Duration,
    ) -> Result<MessageId> {
        validate_body(&body)?;
        validate_delay(delay)?;

        let store = self.open_store(queue_id).await?;
        let message_id = store.enqueue(body, delay).await?;
        tracing::debug!(queue_id, message_id, "Message enqueued");
        Ok(message_id)
    }

    pub async fn add_subscriber(
        &self,
        queue_id: QueueId,
        subscriber: NewSubscriber,
    ) -> Result<Subscriber> {
        subscriber.validate()?;
        self.get_queue(queue_id).await?;

        let subscriber = self
            .catalog
            .insert_subscriber(queue_id, &subscriber.webhook_url)
            .await?;
        info!(
            queue_id,
            subscriber_id = subscriber.id,
            url = %subscriber.webhook_url,
            "Subscriber added"
        );
        Ok(subscriber)
    }

    pub async fn list_subscribers(&self, queue_id: QueueId) -> Result<Vec<Subscriber>> {
        self.get_queue(queue_id).await?;
        self.catalog.list_subscribers(queue_id).await
    }

    pub async fn remove_subscriber(
        &self,
        queue_id: QueueId,
        subscriber_id: SubscriberId,
    ) -> Result<()> {
        if !self
            .catalog
            .delete_subscriber(queue_id, subscriber_id)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Subscriber {} not found on queue {}",
                subscriber_id, queue_id
            )));
        }
        info!(queue_id, subscriber_id, "Subscriber removed");
        Ok(())
    }

    /// Destroy stores left behind by interrupted queue deletions
    ///
    /// # Returns
    /// Number of stores removed
    pub async fn reap_orphaned_stores(&self) -> Result<usize> {
        let known: HashSet<StoreKey> = self.catalog.list_store_keys().await?.into_iter().collect();
        let mut reaped = 0;

        for key in self.stores.list_provisioned().await? {
            if known.contains(&key) {
                continue;
            }
            match self.stores.destroy(key).await {
                Ok(()) => {
                    info!(
                        workspace_id = key.workspace_id,
                        queue_id = key.queue_id,
                        "Removed orphaned store"
                    );
                    reaped += 1;
                }
                Err(e) => warn!(
                    workspace_id = key.workspace_id,
                    queue_id = key.queue_id,
                    error = %e,
                    "Failed to remove orphaned store"
                ),
            }
        }

        Ok(reaped)
    }

    async fn open_store(&self, queue_id: QueueId) -> Result<Arc<dyn QueueStore>> {
        let queue = self.get_queue(queue_id).await?;
        self.stores.open(queue.store_key()).await
    }
}

fn queue_not_found(queue_id: QueueId) -> AppError {
    AppError::NotFound(format!("Queue {} not found", queue_id))
}
