//! `SQLite` PRAGMA configuration for the document cache.

use crate::error::CacheResult;
use rusqlite::Connection;

/// Executes a single SQL statement that may return rows (PRAGMAs).
fn exec_stmt(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    conn.prepare(sql)?.query([])?.next()?;
    Ok(())
}

/// Applies PRAGMA settings suited to a small, write-rare cache.
///
/// - WAL so a CLI invocation can read while a server refreshes
/// - Busy timeout for lock contention between processes
///
/// # Errors
///
/// Returns `CacheError::Sqlite` if any PRAGMA statement fails.
pub fn apply_pragmas(conn: &Connection) -> CacheResult<()> {
    // WAL mode enables concurrent readers during writes
    exec_stmt(conn, "PRAGMA journal_mode = WAL")?;
    // Synchronous NORMAL is safe with WAL, faster than FULL
    exec_stmt(conn, "PRAGMA synchronous = NORMAL")?;
    // 5 second busy timeout for lock contention
    exec_stmt(conn, "PRAGMA busy_timeout = 5000")?;
    // Temp tables in memory
    exec_stmt(conn, "PRAGMA temp_store = MEMORY")?;

    Ok(())
}
