// SQLite Catalog Transaction Implementation

use crate::catalog::{QueueRow, QUEUE_COLUMNS};
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use hookq_core::domain::{NewQueue, Queue, QueueId};
use hookq_core::error::Result;
use hookq_core::port::{CatalogTransaction, TimeProvider, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};
use std::sync::Arc;

pub struct SqliteCatalogTransaction {
    tx: SqlxTransaction<'static, Sqlite>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteCatalogTransaction {
    pub fn new(tx: SqlxTransaction<'static, Sqlite>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { tx, time_provider }
    }
}

#[async_trait]
impl Transaction for SqliteCatalogTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl CatalogTransaction for SqliteCatalogTransaction {
    async fn insert_queue(&mut self, queue: &NewQueue) -> Result<Queue> {
        let now = self.time_provider.now_millis();
        let sql = format!(
            "INSERT INTO queues (workspace_id, name, description, cron, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {}",
            QUEUE_COLUMNS
        );

        let row: QueueRow = sqlx::query_as(&sql)
            .bind(queue.workspace_id)
            .bind(&queue.name)
            .bind(&queue.description)
            .bind(&queue.cron)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_queue(&mut self, id: QueueId) -> Result<Option<Queue>> {
        let sql = format!("SELECT {} FROM queues WHERE id = ?", QUEUE_COLUMNS);
        let row: Option<QueueRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn delete_queue(&mut self, id: QueueId) -> Result<bool> {
        // Subscribers go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM queues WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
