//! duckdocs: MCP server for the DuckDB documentation.
//!
//! Loads the single-file DuckDB documentation, rebuilds its heading
//! hierarchy and answers structural, keyword, fuzzy, function and SQL
//! syntax queries over it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              MCP Server (rmcp)              │
//! │         JSON-RPC over stdin/stdout          │
//! └─────────────────┬───────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────┐
//! │               Tool Layer                    │
//! │  search_docs, get_section, fuzzy_search...  │
//! └───────┬─────────────────────────┬───────────┘
//!         │                         │
//! ┌───────▼────────┐       ┌────────▼──────────┐
//! │   DocStore     │──────▶│  Search/Extract   │
//! │ (RwLock snap.) │ Arc<> │   (stateless)     │
//! └───┬────────┬───┘       └───────────────────┘
//!     │        │
//! ┌───▼───┐ ┌──▼──────────┐
//! │Fetcher│ │CacheMedium  │
//! │reqwest│ │SQLite (r2d2)│
//! └───────┘ └─────────────┘
//! ```

pub mod db;
pub mod error;
pub mod fmt;
pub mod server;
pub mod services;
pub mod tools;
pub mod types;

pub use error::{Result, ServerError};
pub use types::{DocInfo, MatchField, Section, SectionTree};

use std::path::PathBuf;
use xxhash_rust::xxh3::xxh3_64;

/// Computes the default cache database path.
///
/// The path is `<platform cache dir>/duckdocs/docs.db`. One database holds
/// cached copies for every source, keyed by [`cache_key`].
#[must_use]
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("duckdocs")
        .join("docs.db")
}

/// Derives the cache key for a documentation source.
///
/// Uses the xxh3 hash of the trimmed source location so that distinct
/// sources never share a cached copy.
#[must_use]
pub fn cache_key(source: &str) -> String {
    format!("doc-{:016x}", xxh3_64(source.trim().as_bytes()))
}
