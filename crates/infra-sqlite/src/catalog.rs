// SQLite Catalog Implementation

use crate::error::{is_foreign_key_violation, map_sqlx_error};
use crate::SqliteCatalogTransaction;
use async_trait::async_trait;
use hookq_core::domain::{Queue, QueueId, StoreKey, Subscriber, SubscriberId, WorkspaceId};
use hookq_core::error::{AppError, Result};
use hookq_core::port::{Catalog, CatalogTransaction, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;

pub(crate) const QUEUE_COLUMNS: &str = "id, workspace_id, name, description, cron, created_at";

#[derive(sqlx::FromRow)]
pub(crate) struct QueueRow {
    id: i64,
    workspace_id: i64,
    name: String,
    description: String,
    cron: Option<String>,
    created_at: i64,
}

impl From<QueueRow> for Queue {
    fn from(row: QueueRow) -> Self {
        Queue {
            id: row.id,
            workspace_id: row.workspace_id,
            name: row.name,
            description: row.description,
            cron: row.cron,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: i64,
    queue_id: i64,
    webhook_url: String,
    created_at: i64,
}

impl From<SubscriberRow> for Subscriber {
    fn from(row: SubscriberRow) -> Self {
        Subscriber {
            id: row.id,
            queue_id: row.queue_id,
            webhook_url: row.webhook_url,
            created_at: row.created_at,
        }
    }
}

pub struct SqliteCatalog {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteCatalogTransaction::new(
            tx,
            Arc::clone(&self.time_provider),
        )))
    }

    async fn find_queue(&self, id: QueueId) -> Result<Option<Queue>> {
        let sql = format!("SELECT {} FROM queues WHERE id = ?", QUEUE_COLUMNS);
        let row: Option<QueueRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_queues(&self, workspace_id: WorkspaceId) -> Result<Vec<Queue>> {
        let sql = format!(
            "SELECT {} FROM queues WHERE workspace_id = ? ORDER BY id ASC",
            QUEUE_COLUMNS
        );
        let rows: Vec<QueueRow> = sqlx::query_as(&sql)
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_store_keys(&self) -> Result<Vec<StoreKey>> {
        let rows: Vec<(i64, i64)> =
            sqlx::query_as("SELECT workspace_id, id FROM queues ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(workspace_id, queue_id)| StoreKey::new(workspace_id, queue_id))
            .collect())
    }

    async fn insert_subscriber(&self, queue_id: QueueId, webhook_url: &str) -> Result<Subscriber> {
        let now = self.time_provider.now_millis();
        let row: SubscriberRow = sqlx::query_as(
            "INSERT INTO subscribers (queue_id, webhook_url, created_at) VALUES (?, ?, ?) \
             RETURNING id, queue_id, webhook_url, created_at",
        )
        .bind(queue_id)
        .bind(webhook_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Queue row is gone (never existed or deleted concurrently)
            if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("Queue {} not found", queue_id))
            } else {
                map_sqlx_error(e)
            }
        })?;

        Ok(row.into())
    }

    async fn list_subscribers(&self, queue_id: QueueId) -> Result<Vec<Subscriber>> {
        let rows: Vec<SubscriberRow> = sqlx::query_as(
            "SELECT id, queue_id, webhook_url, created_at FROM subscribers \
             WHERE queue_id = ? ORDER BY id ASC",
        )
        .bind(queue_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_subscriber(
        &self,
        queue_id: QueueId,
        subscriber_id: SubscriberId,
    ) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscribers WHERE id = ? AND queue_id = ?")
            .bind(subscriber_id)
            .bind(queue_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
