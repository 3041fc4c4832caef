// sqlx::Error -> AppError mapping

use hookq_core::error::AppError;

/// True when a statement referenced a parent row that does not exist
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("787") | Some("3850"))
        }
        _ => false,
    }
}

/// Convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let Some(code) = db_err.code() else {
                return AppError::Storage(format!("Database error: {}", db_err.message()));
            };

            // SQLite result codes: https://www.sqlite.org/rescode.html
            match code.as_ref() {
                "2067" | "1555" => AppError::Storage(format!(
                    "Unique constraint violation: {} ({})",
                    db_err.message(),
                    code
                )),
                "787" | "3850" => AppError::Storage(format!(
                    "Foreign key constraint violation: {} ({})",
                    db_err.message(),
                    code
                )),
                "5" | "517" => AppError::Storage(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                "13" => AppError::Storage(format!("Database full: {}", db_err.message())),
                "11" | "26" => AppError::Storage(format!(
                    "Database file is corrupt or not a database: {}",
                    db_err.message()
                )),
                "14" => AppError::Storage(format!(
                    "Unable to open database file: {}",
                    db_err.message()
                )),
                other => AppError::Storage(format!(
                    "Database error [{}]: {}",
                    other,
                    db_err.message()
                )),
            }
        }
        sqlx::Error::RowNotFound => AppError::Storage("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Storage(format!("Column not found: {}", col)),
        sqlx::Error::PoolClosed => AppError::Storage("Store connection pool closed".to_string()),
        sqlx::Error::PoolTimedOut => {
            AppError::Storage("Timed out acquiring a store connection".to_string())
        }
        sqlx::Error::Io(io) => AppError::Storage(format!("I/O error: {}", io)),
        // Connection, protocol and configuration errors
        _ => AppError::Storage(err.to_string()),
    }
}
