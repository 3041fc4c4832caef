// Port Layer - Interfaces for external dependencies

pub mod catalog;
pub mod notifier;
pub mod queue_store;
pub mod store_provider;
pub mod time_provider;
pub mod transaction;

// Re-exports
pub use catalog::Catalog;
pub use notifier::{DeliveryError, DeliveryReceipt, DeliveryRequest, WebhookNotifier};
pub use queue_store::{MessageCounts, QueueStore};
pub use store_provider::QueueStoreProvider;
pub use time_provider::TimeProvider;
pub use transaction::{CatalogTransaction, Transaction};
