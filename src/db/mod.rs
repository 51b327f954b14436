//! SQLite-backed document cache with connection pooling.

mod pragmas;
mod schema;

pub use pragmas::apply_pragmas;
pub use schema::{init_schema, SCHEMA_VERSION};

use crate::error::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OptionalExtension;
use std::path::{Path, PathBuf};

/// Cached copy of a source document.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub content: String,
    pub fetched_at: DateTime<Utc>,
}

/// Document cache handle with connection pooling.
///
/// Uses r2d2 because `rusqlite::Connection` is NOT Sync.
/// The pool manages thread-safe access to `SQLite` connections.
pub struct DocCache {
    pool: Pool<SqliteConnectionManager>,
    /// `None` for in-memory caches
    path: Option<PathBuf>,
}

impl DocCache {
    /// Opens or creates a cache database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Pool` if connection pool creation fails.
    /// Returns `CacheError::Sqlite` if schema initialization fails.
    pub fn open(path: &Path) -> CacheResult<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(2)
            .min_idle(Some(1))
            .build(manager)?;

        {
            let conn = pool.get()?;
            apply_pragmas(&conn)?;
            init_schema(&conn)?;
        }

        Ok(Self {
            pool,
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory cache (for testing).
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Pool` if connection pool creation fails.
    /// Returns `CacheError::Sqlite` if schema initialization fails.
    pub fn in_memory() -> CacheResult<Self> {
        let manager = SqliteConnectionManager::memory();
        // A single connection: every pooled memory connection is its own database
        let pool = Pool::builder().max_size(1).build(manager)?;

        {
            let conn = pool.get()?;
            apply_pragmas(&conn)?;
            init_schema(&conn)?;
        }

        Ok(Self { pool, path: None })
    }

    /// Gets a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Pool` if no connection is available within the timeout.
    pub fn conn(&self) -> CacheResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(CacheError::from)
    }

    /// Human-readable location of the cache.
    #[must_use]
    pub fn location(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
    }

    /// Stores (or replaces) a document under `key`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Pool` if no connection is available.
    /// Returns `CacheError::Sqlite` if the upsert fails.
    pub fn put(&self, key: &str, content: &str, fetched_at: DateTime<Utc>) -> CacheResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r"
            INSERT INTO documents (key, content, fetched_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                content = excluded.content,
                fetched_at = excluded.fetched_at
            ",
            rusqlite::params![key, content, fetched_at.timestamp()],
        )?;
        Ok(())
    }

    /// Loads the document stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Pool` if no connection is available.
    /// Returns `CacheError::Sqlite` if the query fails.
    pub fn get(&self, key: &str) -> CacheResult<Option<CachedDocument>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT content, fetched_at FROM documents WHERE key = ?1",
                [key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        Ok(row.map(|(content, ts)| CachedDocument {
            content,
            fetched_at: from_unix(ts),
        }))
    }

    /// Returns when the document under `key` was fetched, if cached.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Pool` if no connection is available.
    /// Returns `CacheError::Sqlite` if the query fails.
    pub fn fetched_at(&self, key: &str) -> CacheResult<Option<DateTime<Utc>>> {
        let conn = self.conn()?;
        let ts = conn
            .query_row(
                "SELECT fetched_at FROM documents WHERE key = ?1",
                [key],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(ts.map(from_unix))
    }
}

fn from_unix(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DocCache>();
};
