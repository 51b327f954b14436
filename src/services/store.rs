//! Documentation store: owns the loaded document and its section tree.
//!
//! All state lives in one immutable [`Snapshot`] behind an `RwLock`.
//! Loads parse outside the lock and swap the snapshot in a single write,
//! so readers see either the previous document or the new one, never a mix.
//! Writers (initialize/refresh) are additionally serialized by a gate so
//! only one fetch runs at a time.

use crate::error::FetchResult;
use crate::services::parser::parse_sections;
use crate::services::search::{self, SearchHit, SearchMode};
use crate::services::{CacheMedium, Fetcher};
use crate::types::{DocInfo, Section, SectionTree};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Single-file DuckDB documentation.
pub const DEFAULT_SOURCE: &str = "https://duckdb.org/duckdb-docs.md";

/// Cached copies older than this are refetched.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the documentation store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// URL or path of the documentation source
    pub source: String,
    /// Key of the cached copy in the cache medium
    pub cache_key: String,
    /// Maximum age of a cached copy that is still used
    pub ttl: Duration,
}

impl StoreConfig {
    /// Configuration for `source` with a derived cache key and the default TTL.
    #[must_use]
    pub fn for_source(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            cache_key: crate::cache_key(&source),
            source,
            ttl: DEFAULT_TTL,
        }
    }

    /// Overrides the cache TTL.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::for_source(DEFAULT_SOURCE)
    }
}

/// One complete loaded state. Replaced wholesale, never mutated.
#[derive(Debug, Default)]
struct Snapshot {
    raw: String,
    tree: Arc<SectionTree>,
    last_updated: Option<DateTime<Utc>>,
    loaded: bool,
}

/// A section with its derived children attached on request.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SectionView {
    #[serde(flatten)]
    pub section: Section,
    /// Direct children (only when requested)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Section>>,
}

/// Owner of the loaded documentation.
///
/// Thread-safe (Send + Sync): reads clone an `Arc` to the current snapshot
/// and never block on an in-flight fetch.
pub struct DocStore {
    config: StoreConfig,
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn CacheMedium>,
    state: RwLock<Arc<Snapshot>>,
    write_gate: Mutex<()>,
}

impl DocStore {
    /// Creates an unloaded store. Call [`DocStore::initialize`] to load.
    pub fn new(config: StoreConfig, fetcher: Arc<dyn Fetcher>, cache: Arc<dyn CacheMedium>) -> Self {
        Self {
            config,
            fetcher,
            cache,
            state: RwLock::new(Arc::new(Snapshot::default())),
            write_gate: Mutex::new(()),
        }
    }

    /// Loads the documentation, preferring a valid cached copy.
    ///
    /// This is a blocking operation - use `spawn_blocking` in async contexts.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error unchanged when no valid cache exists and
    /// the fetch fails. The store is left as it was.
    pub fn initialize(&self) -> FetchResult<()> {
        let _gate = self.write_gate.lock().unwrap_or_else(|e| e.into_inner());
        let start = Instant::now();

        if let Some((text, fetched_at)) = self.load_cached() {
            let count = self.install(text, fetched_at);
            tracing::info!(
                "Loaded {} sections from cache {} in {:?}",
                count,
                self.cache.location(),
                start.elapsed()
            );
            return Ok(());
        }

        let count = self.fetch_and_install()?;
        tracing::info!(
            "Loaded {} sections from {} in {:?}",
            count,
            self.config.source,
            start.elapsed()
        );
        Ok(())
    }

    /// Fetches fresh content regardless of cache state and replaces the
    /// loaded document.
    ///
    /// This is a blocking operation - use `spawn_blocking` in async contexts.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error unchanged. On failure the previously
    /// loaded document, sections and timestamp are kept.
    pub fn refresh(&self) -> FetchResult<()> {
        let _gate = self.write_gate.lock().unwrap_or_else(|e| e.into_inner());
        let start = Instant::now();

        let count = self.fetch_and_install().inspect_err(|e| {
            tracing::warn!("Refresh from {} failed: {}", self.config.source, e);
        })?;
        tracing::info!(
            "Refreshed {} sections from {} in {:?}",
            count,
            self.config.source,
            start.elapsed()
        );
        Ok(())
    }

    /// Whether a document has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.snapshot().loaded
    }

    /// All sections of the current document (empty when unloaded).
    ///
    /// The returned tree is a stable snapshot: later refreshes do not
    /// affect it.
    #[must_use]
    pub fn all_sections(&self) -> Arc<SectionTree> {
        Arc::clone(&self.snapshot().tree)
    }

    /// Sections matching the optional level and parent filters, in
    /// document order.
    #[must_use]
    pub fn get_sections(&self, level: Option<u8>, parent_id: Option<&str>) -> Vec<Section> {
        self.all_sections()
            .filter(level, parent_id)
            .cloned()
            .collect()
    }

    /// Looks up one section by exact id, or else by case-insensitive title
    /// substring. The first match in document order wins.
    #[must_use]
    pub fn get_section(
        &self,
        id: Option<&str>,
        title: Option<&str>,
        include_children: bool,
    ) -> Option<SectionView> {
        let tree = self.all_sections();
        let section = match (id, title) {
            (Some(id), _) => tree.get(id),
            (None, Some(title)) => tree.find_by_title(title),
            (None, None) => None,
        }?;

        let children =
            include_children.then(|| tree.children_of(&section.id).cloned().collect());

        Some(SectionView {
            section: section.clone(),
            children,
        })
    }

    /// Keyword search over the current document.
    #[must_use]
    pub fn search(&self, query: &str, mode: SearchMode, limit: usize) -> Vec<SearchHit> {
        search::search(self.all_sections().sections(), query, mode, limit)
    }

    /// Current document info snapshot.
    #[must_use]
    pub fn doc_info(&self) -> DocInfo {
        let snapshot = self.snapshot();
        DocInfo {
            source: self.config.source.clone(),
            cache_location: self.cache.location(),
            last_updated: snapshot.last_updated,
            section_count: snapshot.tree.len(),
            content_size: snapshot.raw.len(),
            is_loaded: snapshot.loaded,
        }
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Returns the cached text and its fetch time if a fresh copy exists.
    fn load_cached(&self) -> Option<(String, DateTime<Utc>)> {
        let key = &self.config.cache_key;

        match self.cache.exists(key) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("No cached copy for {}", key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Cache lookup failed: {}, fetching fresh", e);
                return None;
            }
        }

        let age = match self.cache.age_of(key) {
            Ok(age) => age,
            Err(e) => {
                tracing::warn!("Cache age check failed: {}, fetching fresh", e);
                return None;
            }
        };
        if age >= self.config.ttl {
            tracing::debug!("Cached copy is stale ({:?} old)", age);
            return None;
        }

        match self.cache.read(key) {
            Ok(text) => {
                let fetched_at = chrono::Duration::from_std(age)
                    .ok()
                    .and_then(|age| Utc::now().checked_sub_signed(age))
                    .unwrap_or_else(Utc::now);
                Some((text, fetched_at))
            }
            Err(e) => {
                tracing::warn!("Cache read failed: {}, fetching fresh", e);
                None
            }
        }
    }

    fn fetch_and_install(&self) -> FetchResult<usize> {
        let text = self.fetcher.fetch(&self.config.source)?;
        let fetched_at = Utc::now();

        if let Err(e) = self.cache.write(&self.config.cache_key, &text) {
            tracing::warn!("Failed to write documentation cache: {}", e);
        }

        Ok(self.install(text, fetched_at))
    }

    /// Parses `text` and swaps it in as the current snapshot.
    fn install(&self, text: String, fetched_at: DateTime<Utc>) -> usize {
        let tree = SectionTree::new(parse_sections(&text));
        let count = tree.len();
        let snapshot = Arc::new(Snapshot {
            raw: text,
            tree: Arc::new(tree),
            last_updated: Some(fetched_at),
            loaded: true,
        });

        *self.state.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
        count
    }
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<DocStore>();
    assert_send_sync::<SectionView>();
    assert_send_sync::<StoreConfig>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DocCache;
    use crate::error::FetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DOC: &str = "# A\ntext a\n## B\ntext b\n# C\ntext c";

    /// Serves a fixed document, or fails when `text` is `None`.
    struct FixedFetcher {
        text: Mutex<Option<String>>,
        calls: AtomicUsize,
    }

    impl FixedFetcher {
        fn new(text: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                text: Mutex::new(text.map(str::to_string)),
                calls: AtomicUsize::new(0),
            })
        }

        fn set(&self, text: Option<&str>) {
            *self.text.lock().unwrap() = text.map(str::to_string);
        }
    }

    impl Fetcher for FixedFetcher {
        fn fetch(&self, location: &str) -> FetchResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.text
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| FetchError::FetchFailed {
                    location: location.to_string(),
                    reason: "offline".to_string(),
                })
        }
    }

    fn store_with(fetcher: Arc<FixedFetcher>) -> DocStore {
        let cache = Arc::new(DocCache::in_memory().unwrap());
        DocStore::new(StoreConfig::for_source("test://docs"), fetcher, cache)
    }

    #[test]
    fn test_unloaded_store_degrades_to_empty() {
        let store = store_with(FixedFetcher::new(None));
        assert!(!store.is_loaded());
        assert!(store.all_sections().is_empty());
        assert!(store.get_sections(None, None).is_empty());
        assert!(store.get_section(Some("a"), None, false).is_none());

        let info = store.doc_info();
        assert!(!info.is_loaded);
        assert_eq!(info.section_count, 0);
        assert!(info.last_updated.is_none());
    }

    #[test]
    fn test_initialize_fetches_and_parses() {
        let store = store_with(FixedFetcher::new(Some(DOC)));
        store.initialize().unwrap();

        let info = store.doc_info();
        assert!(info.is_loaded);
        assert_eq!(info.section_count, 3);
        assert_eq!(info.content_size, DOC.len());
        assert!(info.last_updated.is_some());
    }

    #[test]
    fn test_failed_initialize_stays_unloaded() {
        let store = store_with(FixedFetcher::new(None));
        let err = store.initialize().unwrap_err();
        assert_eq!(err.code(), "FETCH_FAILED");
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_initialize_prefers_fresh_cache() {
        let fetcher = FixedFetcher::new(Some(DOC));
        let cache = Arc::new(DocCache::in_memory().unwrap());
        let config = StoreConfig::for_source("test://docs");
        cache.put(&config.cache_key, "# Cached\nbody", Utc::now()).unwrap();

        let store = DocStore::new(config, fetcher.clone(), cache);
        store.initialize().unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.all_sections().sections()[0].title, "Cached");
    }

    #[test]
    fn test_initialize_ignores_stale_cache() {
        let fetcher = FixedFetcher::new(Some(DOC));
        let cache = Arc::new(DocCache::in_memory().unwrap());
        let config = StoreConfig::for_source("test://docs");
        cache
            .put(
                &config.cache_key,
                "# Cached\nbody",
                Utc::now() - chrono::Duration::hours(25),
            )
            .unwrap();

        let store = DocStore::new(config.clone(), fetcher.clone(), cache.clone());
        store.initialize().unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.all_sections().len(), 3);
        assert_eq!(cache.get(&config.cache_key).unwrap().unwrap().content, DOC);
    }

    #[test]
    fn test_refresh_failure_keeps_previous_state() {
        let fetcher = FixedFetcher::new(Some(DOC));
        let store = store_with(fetcher.clone());
        store.initialize().unwrap();
        let before = store.doc_info();

        fetcher.set(None);
        assert!(store.refresh().is_err());

        let after = store.doc_info();
        assert!(after.is_loaded);
        assert_eq!(after.section_count, before.section_count);
        assert_eq!(after.last_updated, before.last_updated);
    }

    #[test]
    fn test_refresh_replaces_sections() {
        let fetcher = FixedFetcher::new(Some(DOC));
        let store = store_with(fetcher.clone());
        store.initialize().unwrap();
        let old_tree = store.all_sections();

        fetcher.set(Some("# Only\none"));
        store.refresh().unwrap();

        assert_eq!(store.all_sections().len(), 1);
        // Snapshots handed out earlier are unaffected
        assert_eq!(old_tree.len(), 3);
    }

    #[test]
    fn test_get_section_by_title_with_children() {
        let store = store_with(FixedFetcher::new(Some(DOC)));
        store.initialize().unwrap();

        let view = store.get_section(None, Some("b"), true).unwrap();
        assert_eq!(view.section.id, "b");
        assert_eq!(view.children.as_deref(), Some(&[][..]));

        let view = store.get_section(Some("a"), None, true).unwrap();
        let children: Vec<_> = view.children.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(children, ["b"]);
    }

    #[test]
    fn test_get_section_children_of_repeated_anchor() {
        let store = store_with(FixedFetcher::new(Some(
            "# One {#dup}\n## Inner\n# Two {#dup}\n## Other",
        )));
        store.initialize().unwrap();

        let view = store.get_section(Some("dup"), None, true).unwrap();
        assert_eq!(view.section.title, "One");
        let children: Vec<_> = view.children.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(children, ["inner"]);
    }

    #[test]
    fn test_get_section_id_takes_precedence() {
        let store = store_with(FixedFetcher::new(Some(DOC)));
        store.initialize().unwrap();

        let view = store.get_section(Some("c"), Some("a"), false).unwrap();
        assert_eq!(view.section.id, "c");
        assert!(view.children.is_none());
        assert!(store.get_section(None, None, false).is_none());
    }

    #[test]
    fn test_get_sections_filters() {
        let store = store_with(FixedFetcher::new(Some(DOC)));
        store.initialize().unwrap();

        assert_eq!(store.get_sections(Some(1), None).len(), 2);
        assert_eq!(store.get_sections(None, Some("a")).len(), 1);
        assert!(store.get_sections(Some(1), Some("a")).is_empty());
    }

    #[test]
    fn test_search_uses_current_document() {
        let store = store_with(FixedFetcher::new(Some(DOC)));
        assert!(store.search("text b", SearchMode::All, 10).is_empty());

        store.initialize().unwrap();
        let hits = store.search("text b", SearchMode::All, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].section.id, "b");
        assert_eq!(hits[0].score, 5);
    }
}
