// Queue Store Port (Interface)

use crate::domain::{Message, MessageId};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Lease taken by `drain_all` for each message it removes
pub const DRAIN_LEASE: Duration = Duration::from_secs(30);

/// Snapshot of a store's contents at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageCounts {
    pub visible: i64,
    pub leased: i64,
}

impl MessageCounts {
    pub fn total(&self) -> i64 {
        self.visible + self.leased
    }
}

/// Durable FIFO mailbox of a single queue
///
/// Implementations must make `receive` an atomic select-and-lease so that
/// concurrent callers (other tasks or other processes opening the same
/// store) never hold a lease on the same message at the same time.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Persist a message that becomes visible after `delay`
    async fn enqueue(&self, body: Bytes, delay: Duration) -> Result<MessageId>;

    /// Lease the oldest visible message for `lease`, or `None` if none is visible
    async fn receive(&self, lease: Duration) -> Result<Option<Message>>;

    /// Remove a message whatever its visibility; `NotFound` if it is gone
    async fn delete(&self, id: MessageId) -> Result<()>;

    /// Count visible and leased messages
    async fn count(&self) -> Result<MessageCounts>;

    /// Receive and delete until the store reports no visible message
    ///
    /// Best effort: messages enqueued while draining may or may not be
    /// caught, and messages leased by someone else stay where they are.
    ///
    /// # Returns
    /// Number of messages deleted
    async fn drain_all(&self) -> Result<u64> {
        let mut drained = 0;
        while let Some(message) = self.receive(DRAIN_LEASE).await? {
            match self.delete(message.id).await {
                Ok(()) => drained += 1,
                // Another consumer deleted it after our lease was taken over
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(drained)
    }
}
