//! Shared wiring for integration tests: in-memory catalog, temp-dir stores,
//! manual clock

#![allow(dead_code)]

use hookq_core::application::{DispatchConfig, Dispatcher, FanOut, QueueService};
use hookq_core::domain::{NewQueue, Queue};
use hookq_core::port::time_provider::ManualTimeProvider;
use hookq_core::port::{Catalog, QueueStoreProvider, WebhookNotifier};
use hookq_infra_sqlite::{create_pool, run_catalog_migrations, SqliteCatalog, SqliteStoreRegistry};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const START_MILLIS: i64 = 1_700_000_000_000;

pub struct Harness {
    pub dir: TempDir,
    pub clock: Arc<ManualTimeProvider>,
    pub catalog: Arc<SqliteCatalog>,
    pub registry: Arc<SqliteStoreRegistry>,
    pub service: Arc<QueueService>,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualTimeProvider::new(START_MILLIS));

        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_catalog_migrations(&pool).await.unwrap();

        let catalog = Arc::new(SqliteCatalog::new(pool, clock.clone()));
        let registry = Arc::new(SqliteStoreRegistry::new(dir.path(), clock.clone()));
        let service = Arc::new(QueueService::new(
            catalog.clone() as Arc<dyn Catalog>,
            registry.clone() as Arc<dyn QueueStoreProvider>,
        ));

        Self {
            dir,
            clock,
            catalog,
            registry,
            service,
        }
    }

    pub async fn create_queue(&self, workspace_id: i64, name: &str) -> Queue {
        self.service
            .create_queue(NewQueue::new(workspace_id, name))
            .await
            .unwrap()
    }

    pub fn dispatcher(&self, notifier: Arc<dyn WebhookNotifier>) -> Dispatcher {
        Dispatcher::new(
            self.catalog.clone(),
            self.registry.clone(),
            FanOut::new(notifier, 8),
            DispatchConfig {
                interval: Duration::from_millis(50),
                lease: Duration::from_secs(30),
            },
        )
    }
}

/// Poll until `condition` holds, panicking after two seconds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
