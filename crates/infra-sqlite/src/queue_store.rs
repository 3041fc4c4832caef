// SQLite QueueStore Implementation (one database file per queue)

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use bytes::Bytes;
use hookq_core::domain::message::duration_millis;
use hookq_core::domain::{Message, MessageId, StoreKey};
use hookq_core::error::{AppError, Result};
use hookq_core::port::{MessageCounts, QueueStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    body: Vec<u8>,
    created_at: i64,
    visible_at: i64,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            body: Bytes::from(row.body),
            created_at: row.created_at,
            visible_at: row.visible_at,
        }
    }
}

pub struct SqliteQueueStore {
    pool: SqlitePool,
    key: StoreKey,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteQueueStore {
    /// Wrap a pool whose schema has already been migrated
    pub fn new(pool: SqlitePool, key: StoreKey, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            key,
            time_provider,
        }
    }

    pub fn key(&self) -> StoreKey {
        self.key
    }

    /// Close every pooled connection; later calls on this handle fail
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn enqueue(&self, body: Bytes, delay: Duration) -> Result<MessageId> {
        let now = self.time_provider.now_millis();
        let visible_at = now.saturating_add(duration_millis(delay));

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO messages (body, created_at, visible_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&body[..])
        .bind(now)
        .bind(visible_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(id)
    }

    async fn receive(&self, lease: Duration) -> Result<Option<Message>> {
        let now = self.time_provider.now_millis();
        let leased_until = now.saturating_add(duration_millis(lease));

        // Single statement: selecting the oldest visible row and pushing its
        // visibility forward happen under one write lock
        let row: Option<MessageRow> = sqlx::query_as(
            r#"
            UPDATE messages
            SET visible_at = ?
            WHERE id = (
                SELECT id FROM messages
                WHERE visible_at <= ?
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            RETURNING id, body, created_at, visible_at
            "#,
        )
        .bind(leased_until)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn delete(&self, id: MessageId) -> Result<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Message {} not found in store {}",
                id, self.key
            )));
        }
        Ok(())
    }

    async fn count(&self) -> Result<MessageCounts> {
        let now = self.time_provider.now_millis();
        let (visible, leased): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN visible_at <= ? THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN visible_at > ? THEN 1 ELSE 0 END), 0)
            FROM messages
            "#,
        )
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(MessageCounts { visible, leased })
    }
}
