//! Cache database schema definitions.

use crate::error::CacheResult;
use rusqlite::Connection;

/// Current schema version for migrations.
pub const SCHEMA_VERSION: u32 = 1;

/// Initializes the cache schema.
///
/// # Errors
///
/// Returns `CacheError::Sqlite` if schema creation fails.
pub fn init_schema(conn: &Connection) -> CacheResult<()> {
    conn.execute_batch(
        r#"
        -- One row per cached source document
        CREATE TABLE IF NOT EXISTS documents (
            key TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            fetched_at INTEGER NOT NULL
        ) WITHOUT ROWID;

        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        ) WITHOUT ROWID;
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pragmas::apply_pragmas;

    #[test]
    fn test_schema_creation() {
        let conn = Connection::open_in_memory().unwrap();
        apply_pragmas(&conn).unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"schema_info".to_string()));
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let version: String = conn
            .query_row(
                "SELECT value FROM schema_info WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION.to_string());
    }
}
