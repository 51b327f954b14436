//! Common test utilities for duckdocs integration tests.
//!
//! Provides a scripted fetcher, an in-memory cache medium with
//! controllable entry ages, and a small documentation sample.

#![allow(dead_code)] // Test utilities may not all be used in every test file

use duckdocs::error::{CacheError, CacheResult, FetchError, FetchResult};
use duckdocs::services::{CacheMedium, DocStore, Fetcher, StoreConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source location used by every test store.
pub const TEST_SOURCE: &str = "https://docs.example.test/duckdb-docs.md";

/// A small documentation file with the usual DuckDB shapes: chapters,
/// statement sections with syntax blocks, function sections with
/// parameter tables, and one explicit anchor.
pub const SAMPLE_DOCS: &str = "\
# DuckDB Documentation
Welcome to DuckDB, an in-process SQL OLAP database.

## Installation
Install the CLI or use a client library.

# SQL
The SQL dialect reference.

## SELECT Statement
The SELECT statement retrieves rows from the database.

```sql
SELECT select_list FROM tables WHERE condition;
```

## CREATE TABLE Statement
Creates a new table.

```sql
CREATE TABLE tbl_name (col_name type, ...);
```

### Examples {#create-table-examples}
Create a table with a primary key.

# Functions
Functions are listed below.

## read_csv Function
Reads a CSV file. Returns a Table with the inferred columns.

```sql
read_csv(path, delim = ',')
```

| Name | Description |
|------|-------------|
| `path` | File to read |
| delim | Column separator |

## Text Functions
Use lower(string) to lowercase and upper(string) to uppercase. concat(a, b) joins strings.

## Date Functions
date_trunc(part, date) truncates a date. Returns a TIMESTAMP.
";

/// Number of sections in [`SAMPLE_DOCS`].
pub const SAMPLE_SECTION_COUNT: usize = 10;

/// Fetcher that serves scripted text, or fails while no text is set.
pub struct ScriptedFetcher {
    text: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    /// A fetcher that returns `text`.
    pub fn serving(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Mutex::new(Some(text.to_string())),
            calls: AtomicUsize::new(0),
        })
    }

    /// A fetcher that always fails.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            text: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    /// Changes what later fetches return.
    pub fn set_text(&self, text: &str) {
        *self.text.lock().unwrap() = Some(text.to_string());
    }

    /// Makes later fetches fail.
    pub fn set_failing(&self) {
        *self.text.lock().unwrap() = None;
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, location: &str) -> FetchResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FetchError::FetchFailed {
                location: location.to_string(),
                reason: "connection refused".to_string(),
            })
    }
}

/// In-memory cache medium whose entry ages are set by the test.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
    fail_lookups: AtomicBool,
    fail_ages: AtomicBool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stores `text` under `key` as if it had been written `age` ago.
    pub fn seed(&self, key: &str, text: &str, age: Duration) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (text.to_string(), age));
    }

    /// Makes every later `exists` check fail.
    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    /// Makes every later `age_of` call fail.
    pub fn fail_ages(&self) {
        self.fail_ages.store(true, Ordering::SeqCst);
    }

    /// Makes every later `read` fail.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Makes every later write fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current text under `key`, if any.
    pub fn text(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(text, _)| text.clone())
    }
}

impl CacheMedium for MemoryCache {
    fn exists(&self, key: &str) -> CacheResult<bool> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(CacheError::Missing {
                key: key.to_string(),
            });
        }
        Ok(self.entries.lock().unwrap().contains_key(key))
    }

    fn age_of(&self, key: &str) -> CacheResult<Duration> {
        if self.fail_ages.load(Ordering::SeqCst) {
            return Err(CacheError::Missing {
                key: key.to_string(),
            });
        }
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, age)| *age)
            .ok_or_else(|| CacheError::Missing {
                key: key.to_string(),
            })
    }

    fn read(&self, key: &str) -> CacheResult<String> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Missing {
                key: key.to_string(),
            });
        }
        self.text(key).ok_or_else(|| CacheError::Missing {
            key: key.to_string(),
        })
    }

    fn write(&self, key: &str, text: &str) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Missing {
                key: key.to_string(),
            });
        }
        self.seed(key, text, Duration::ZERO);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Configuration shared by all test stores.
pub fn test_config() -> StoreConfig {
    StoreConfig::for_source(TEST_SOURCE)
}

/// Builds an unloaded store over the given collaborators.
pub fn store_with(fetcher: Arc<ScriptedFetcher>, cache: Arc<MemoryCache>) -> DocStore {
    DocStore::new(test_config(), fetcher, cache)
}

/// A store with [`SAMPLE_DOCS`] loaded.
pub fn loaded_store() -> DocStore {
    let store = store_with(ScriptedFetcher::serving(SAMPLE_DOCS), MemoryCache::new());
    store.initialize().expect("sample docs should load");
    store
}

/// A synthetic document with `count` top-level sections whose ids all
/// start with `prefix`.
pub fn generated_docs(prefix: &str, count: usize) -> String {
    (0..count)
        .map(|i| format!("# {prefix} part {i}\nBody of {prefix} part {i}.\n"))
        .collect()
}
