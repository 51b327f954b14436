//! Search-related MCP tools.

use crate::error::{Result, ServerError};
use crate::services::{fuzzy_search, DocStore, SearchMode};
use crate::types::MatchField;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Hard cap on results per search call.
const MAX_LIMIT: usize = 100;

/// Input for the search tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchInput {
    /// Text to look for (case-insensitive substring)
    pub query: String,
    /// Search mode: "title", "content", or "all"
    #[serde(default)]
    pub mode: SearchMode,
    /// Maximum results to return (default: 10)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

const fn default_limit() -> usize {
    10
}

/// A single search result.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchResultItem {
    /// Section id, usable with get_section
    pub id: String,
    pub title: String,
    pub level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// 10 for a title match, 5 for a content match, summed
    pub score: u32,
    /// Fields the query matched in
    pub matches: Vec<MatchField>,
    /// Excerpt around the first content match
    pub snippet: String,
}

/// Output for the search tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchOutput {
    pub results: Vec<SearchResultItem>,
    /// Number of results returned
    pub total_returned: usize,
    /// Whether more results exist beyond the limit
    pub has_more: bool,
    /// Query that was executed
    pub query: String,
    pub mode: SearchMode,
}

/// Executes the search tool.
///
/// # Errors
///
/// Returns `ServerError::Tool` for an empty query.
pub fn execute_search(store: &DocStore, input: SearchInput) -> Result<SearchOutput> {
    let query = require_query(&input.query)?;
    let limit = input.limit.min(MAX_LIMIT);
    // Overcollect by 1 to detect if more results exist
    let hits = store.search(query, input.mode, limit + 1);
    let has_more = hits.len() > limit;

    let results: Vec<SearchResultItem> = hits
        .into_iter()
        .take(limit)
        .map(|hit| SearchResultItem {
            id: hit.section.id,
            title: hit.section.title,
            level: hit.section.level,
            parent_id: hit.section.parent_id,
            score: hit.score,
            matches: hit.matches,
            snippet: hit.snippet,
        })
        .collect();

    Ok(SearchOutput {
        total_returned: results.len(),
        has_more,
        results,
        query: query.to_string(),
        mode: input.mode,
    })
}

/// Input for the fuzzy search tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FuzzySearchInput {
    /// Approximate text; characters are matched in order, typos tolerated
    pub query: String,
    /// Maximum results to return (default: 10)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// A single fuzzy search result.
#[derive(Debug, Serialize, JsonSchema)]
pub struct FuzzyResultItem {
    pub id: String,
    pub title: String,
    pub level: u8,
    pub score: f64,
    /// Whether the title or the content scored higher
    pub matched_in: MatchField,
}

/// Output for the fuzzy search tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct FuzzySearchOutput {
    pub results: Vec<FuzzyResultItem>,
    pub total_returned: usize,
    pub query: String,
}

/// Executes the fuzzy search tool.
///
/// # Errors
///
/// Returns `ServerError::Tool` for an empty query.
pub fn execute_fuzzy_search(store: &DocStore, input: FuzzySearchInput) -> Result<FuzzySearchOutput> {
    let query = require_query(&input.query)?;
    let tree = store.all_sections();

    let results: Vec<FuzzyResultItem> = fuzzy_search(tree.sections(), query, input.limit.min(MAX_LIMIT))
        .into_iter()
        .map(|hit| FuzzyResultItem {
            id: hit.section.id,
            title: hit.section.title,
            level: hit.section.level,
            score: hit.score,
            matched_in: hit.matched_in,
        })
        .collect();

    Ok(FuzzySearchOutput {
        total_returned: results.len(),
        results,
        query: query.to_string(),
    })
}

/// Trims the query and rejects empty ones.
pub(crate) fn require_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ServerError::Tool("Query must not be empty.".to_string()));
    }
    Ok(trimmed)
}
