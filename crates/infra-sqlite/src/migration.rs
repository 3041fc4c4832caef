// Migration Runner

use crate::error::map_sqlx_error;
use hookq_core::error::Result;
use sqlx::SqlitePool;
use tracing::{debug, info};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const CATALOG_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "Initial catalog schema",
    sql: include_str!("../migrations/catalog/001_initial_schema.sql"),
}];

const STORE_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "Message table",
    sql: include_str!("../migrations/store/001_messages.sql"),
}];

/// Run catalog database migrations
pub async fn run_catalog_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running catalog migrations...");
    let applied = run_migrations(pool, CATALOG_MIGRATIONS).await?;
    info!(applied, "Catalog migrations complete");
    Ok(())
}

/// Run migrations of a single queue store (idempotent, runs on every open)
pub async fn run_store_migrations(pool: &SqlitePool) -> Result<()> {
    run_migrations(pool, STORE_MIGRATIONS).await.map(|_| ())
}

async fn run_migrations(pool: &SqlitePool, migrations: &[Migration]) -> Result<usize> {
    // Check if schema_version table exists
    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    let current_version: i64 = if table_exists > 0 {
        sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await
            .map_err(map_sqlx_error)?
            .unwrap_or(0)
    } else {
        0
    };

    let mut applied = 0;
    for migration in migrations.iter().filter(|m| m.version > current_version) {
        debug!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        apply_migration(pool, migration).await?;
        applied += 1;
    }

    Ok(applied)
}

/// Apply a single migration and record its version, atomically
async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    // Split by semicolon and execute each statement
    for statement in migration.sql.split(';') {
        let clean_statement = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let clean_statement = clean_statement.trim();

        if !clean_statement.is_empty() {
            sqlx::query(clean_statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
    }

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(migration.version)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    tx.commit().await.map_err(map_sqlx_error)?;
    Ok(())
}
