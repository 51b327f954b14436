//! Core domain types for duckdocs.
//!
//! A loaded document is a flat, document-ordered list of [`Section`]s.
//! Hierarchy is expressed only through `parent_id` back-references;
//! children are always derived by filtering, never stored.

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contiguous span of the source document rooted at one heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    /// Explicit `{#anchor}` from the heading, or a slug generated from the title
    pub id: String,
    /// Heading text with anchor markup stripped
    pub title: String,
    /// Number of heading markers (1-6)
    pub level: u8,
    /// Trimmed text between this heading and the next one
    pub content: String,
    /// Zero-based line of the heading
    pub start_line: usize,
    /// Zero-based last line of the section (inclusive)
    pub end_line: usize,
    /// Nearest preceding section with a strictly smaller level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Where a search query matched inside a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Title,
    Content,
}

impl fmt::Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Content => f.write_str("content"),
        }
    }
}

/// Ordered section list plus an id index built once after parsing.
///
/// Immutable once built; a refresh replaces the whole tree.
#[derive(Debug, Default)]
pub struct SectionTree {
    sections: Vec<Section>,
    /// id -> position of the first section carrying that id
    by_id: AHashMap<String, usize>,
}

impl SectionTree {
    #[must_use]
    pub fn new(sections: Vec<Section>) -> Self {
        let mut by_id = AHashMap::with_capacity(sections.len());
        for (idx, section) in sections.iter().enumerate() {
            by_id.entry(section.id.clone()).or_insert(idx);
        }
        Self { sections, by_id }
    }

    /// All sections in document order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// First section with exactly this id, in document order.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Section> {
        self.by_id.get(id).map(|&idx| &self.sections[idx])
    }

    /// First section whose title contains `query`, case-insensitively.
    #[must_use]
    pub fn find_by_title(&self, query: &str) -> Option<&Section> {
        let needle = query.to_lowercase();
        self.sections
            .iter()
            .find(|s| s.title.to_lowercase().contains(&needle))
    }

    /// Direct children of the first section with this id.
    ///
    /// Children follow their parent and end at the next section of the
    /// same or a shallower level, so a repeated id never pulls in the
    /// children of a later namesake.
    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Section> + 'a {
        let (start, level) = self
            .by_id
            .get(id)
            .map_or((self.sections.len(), 0), |&idx| {
                (idx + 1, self.sections[idx].level)
            });
        self.sections[start..]
            .iter()
            .take_while(move |s| s.level > level)
            .filter(move |s| s.parent_id.as_deref() == Some(id))
    }

    /// Sections matching both optional equality filters, order preserved.
    pub fn filter<'a>(
        &'a self,
        level: Option<u8>,
        parent_id: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Section> + 'a {
        self.sections.iter().filter(move |s| {
            level.is_none_or(|l| s.level == l)
                && parent_id.is_none_or(|p| s.parent_id.as_deref() == Some(p))
        })
    }
}

/// Snapshot of the loaded document's state.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DocInfo {
    /// URL or path the documentation is fetched from
    pub source: String,
    /// Where the cached copy lives
    pub cache_location: String,
    /// When the loaded content was fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Number of parsed sections
    pub section_count: usize,
    /// Raw content size in bytes
    pub content_size: usize,
    /// Whether a document has been loaded
    pub is_loaded: bool,
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<Section>();
    assert_send_sync::<SectionTree>();
    assert_send_sync::<DocInfo>();
};
