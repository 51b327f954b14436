//! Cache medium abstraction used by the documentation store.

use crate::db::DocCache;
use crate::error::{CacheError, CacheResult};
use chrono::Utc;
use std::time::Duration;

/// Keyed storage for fetched documentation text.
///
/// The store treats every error from a medium as "no usable cache":
/// reads fall back to fetching, writes are logged and skipped.
pub trait CacheMedium: Send + Sync {
    /// Whether an entry exists for `key`.
    fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Time elapsed since the entry for `key` was written.
    fn age_of(&self, key: &str) -> CacheResult<Duration>;

    /// Reads the cached text for `key`.
    fn read(&self, key: &str) -> CacheResult<String>;

    /// Writes (or replaces) the cached text for `key`.
    fn write(&self, key: &str, text: &str) -> CacheResult<()>;

    /// Human-readable location, reported in document info.
    fn location(&self) -> String;
}

impl CacheMedium for DocCache {
    fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.fetched_at(key)?.is_some())
    }

    fn age_of(&self, key: &str) -> CacheResult<Duration> {
        let fetched_at = self.fetched_at(key)?.ok_or_else(|| CacheError::Missing {
            key: key.to_string(),
        })?;
        // Clock skew can put fetched_at in the future; treat that as fresh
        Ok((Utc::now() - fetched_at).to_std().unwrap_or(Duration::ZERO))
    }

    fn read(&self, key: &str) -> CacheResult<String> {
        self.get(key)?
            .map(|doc| doc.content)
            .ok_or_else(|| CacheError::Missing {
                key: key.to_string(),
            })
    }

    fn write(&self, key: &str, text: &str) -> CacheResult<()> {
        self.put(key, text, Utc::now())
    }

    fn location(&self) -> String {
        DocCache::location(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_doc_cache_medium_roundtrip() {
        let cache = DocCache::in_memory().unwrap();
        assert!(!cache.exists("k").unwrap());

        CacheMedium::write(&cache, "k", "text").unwrap();
        assert!(cache.exists("k").unwrap());
        assert_eq!(cache.read("k").unwrap(), "text");
        assert!(cache.age_of("k").unwrap() < Duration::from_secs(60));
    }

    #[test]
    fn test_age_reflects_fetch_time() {
        let cache = DocCache::in_memory().unwrap();
        cache
            .put("k", "old", Utc::now() - ChronoDuration::hours(30))
            .unwrap();
        let age = cache.age_of("k").unwrap();
        assert!(age >= Duration::from_secs(29 * 3600));
    }

    #[test]
    fn test_missing_entry_errors() {
        let cache = DocCache::in_memory().unwrap();
        assert!(matches!(cache.read("k"), Err(CacheError::Missing { .. })));
        assert!(matches!(cache.age_of("k"), Err(CacheError::Missing { .. })));
    }
}
