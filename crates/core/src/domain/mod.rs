// Domain Layer - Pure business logic and entities

pub mod error;
pub mod message;
pub mod queue;
pub mod subscriber;

// Re-exports
pub use error::DomainError;
pub use message::{Message, MessageId, Visibility};
pub use queue::{NewQueue, Queue, QueueId, StoreKey, WorkspaceId};
pub use subscriber::{NewSubscriber, Subscriber, SubscriberId};
