// SQLite Connection Pool Setup

use crate::error::map_sqlx_error;
use hookq_core::error::Result;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const CATALOG_MAX_CONNECTIONS: u32 = 10;
const STORE_MAX_CONNECTIONS: u32 = 4;

/// Create the catalog connection pool with WAL mode and foreign keys enabled
///
/// Accepts a path, a `sqlite:` URL, or `sqlite::memory:` / `:memory:`. An
/// in-memory database lives inside a single connection, so the pool is
/// pinned to one connection that is never recycled.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let in_memory = database_url.contains(":memory:");
    let url = if in_memory || database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite://{}", database_url)
    };

    let options = SqliteConnectOptions::from_str(&url)
        .map_err(map_sqlx_error)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true)
        .create_if_missing(true);

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(CATALOG_MAX_CONNECTIONS)
    };

    pool_options
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)
}

/// Open the pool of one queue store.
///
/// `create` decides whether a missing file is created; the registry passes
/// `false` when reopening so a destroyed store is never resurrected.
/// `synchronous = FULL` makes an acknowledged enqueue survive power loss.
pub async fn open_store_pool(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .busy_timeout(BUSY_TIMEOUT)
        .create_if_missing(create);

    SqlitePoolOptions::new()
        .max_connections(STORE_MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_pool() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_pool_from_plain_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.db");
        let pool = create_pool(path.to_str().unwrap()).await.unwrap();
        assert!(pool.acquire().await.is_ok());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_open_store_pool_without_create_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sqlite");
        assert!(open_store_pool(&path, false).await.is_err());
        assert!(!path.exists());
    }
}
