// hookq Infrastructure - SQLite Adapter
// Implements: Catalog, CatalogTransaction, QueueStore, QueueStoreProvider

mod catalog;
mod connection;
mod error;
mod migration;
mod queue_store;
mod registry;
mod transaction;

pub use catalog::SqliteCatalog;
pub use connection::{create_pool, open_store_pool};
pub use migration::{run_catalog_migrations, run_store_migrations};
pub use queue_store::SqliteQueueStore;
pub use registry::{store_path, SqliteStoreRegistry};
pub use transaction::SqliteCatalogTransaction;

// Note: sqlx::Error conversion is handled by `error::map_sqlx_error`
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
