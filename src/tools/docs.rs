//! Document structure MCP tools: info, refresh, outline and section lookup.

use crate::error::{Result, ServerError};
use crate::services::{DocStore, SectionView};
use crate::types::{DocInfo, Section};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Executes the doc info tool.
#[must_use]
pub fn execute_doc_info(store: &DocStore) -> DocInfo {
    store.doc_info()
}

/// Output for the refresh tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct RefreshOutput {
    /// Sections in the freshly loaded document
    pub section_count: usize,
    /// Raw content size in bytes
    pub content_size: usize,
    /// Fetch time of the new content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Status message
    pub message: String,
}

/// Executes the refresh tool.
///
/// # Errors
///
/// Returns `ServerError::Fetch` if the source cannot be fetched; the
/// previously loaded document stays in place.
pub fn execute_refresh(store: &DocStore) -> Result<RefreshOutput> {
    store.refresh()?;
    let info = store.doc_info();

    Ok(RefreshOutput {
        section_count: info.section_count,
        content_size: info.content_size,
        last_updated: info.last_updated,
        message: format!(
            "Documentation refreshed from {}: {} sections",
            info.source, info.section_count
        ),
    })
}

/// Input for the list sections tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListSectionsInput {
    /// Only sections at this heading level (1-6)
    #[serde(default)]
    pub level: Option<u8>,
    /// Only direct children of this section id
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Maximum sections to return (default: 200)
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

const fn default_list_limit() -> usize {
    200
}

/// Hard cap on sections per listing.
const MAX_LIST_LIMIT: usize = 1000;

/// One row of a section outline.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SectionOutline {
    pub id: String,
    pub title: String,
    pub level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Zero-based line span (inclusive)
    pub start_line: usize,
    pub end_line: usize,
    /// Length of the section body in characters
    pub content_chars: usize,
}

impl From<&Section> for SectionOutline {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id.clone(),
            title: section.title.clone(),
            level: section.level,
            parent_id: section.parent_id.clone(),
            start_line: section.start_line,
            end_line: section.end_line,
            content_chars: section.content.chars().count(),
        }
    }
}

/// Output for the list sections tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListSectionsOutput {
    pub sections: Vec<SectionOutline>,
    /// Sections matching the filters
    pub total_matched: usize,
    /// Number of sections returned
    pub total_returned: usize,
    /// Whether more sections exist beyond the limit
    pub has_more: bool,
}

/// Executes the list sections tool.
#[must_use]
pub fn execute_list_sections(store: &DocStore, input: ListSectionsInput) -> ListSectionsOutput {
    let tree = store.all_sections();
    let matched: Vec<&Section> = tree.filter(input.level, input.parent_id.as_deref()).collect();

    let sections: Vec<SectionOutline> = matched
        .iter()
        .take(input.limit.min(MAX_LIST_LIMIT))
        .map(|s| SectionOutline::from(*s))
        .collect();

    ListSectionsOutput {
        total_matched: matched.len(),
        total_returned: sections.len(),
        has_more: matched.len() > sections.len(),
        sections,
    }
}

/// Input for the get section tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GetSectionInput {
    /// Exact section id (takes precedence over title)
    #[serde(default)]
    pub id: Option<String>,
    /// Case-insensitive title substring
    #[serde(default)]
    pub title: Option<String>,
    /// Attach direct child sections
    #[serde(default)]
    pub include_children: bool,
}

/// Executes the get section tool.
///
/// # Errors
///
/// Returns `ServerError::Tool` when neither id nor title is given and
/// `ServerError::SectionNotFound` when nothing matches.
pub fn execute_get_section(store: &DocStore, input: GetSectionInput) -> Result<SectionView> {
    let id = input.id.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let title = input.title.as_deref().map(str::trim).filter(|s| !s.is_empty());

    if id.is_none() && title.is_none() {
        return Err(ServerError::Tool(
            "Provide either 'id' or 'title' to look up a section.".to_string(),
        ));
    }

    store
        .get_section(id, title, input.include_children)
        .ok_or_else(|| ServerError::SectionNotFound {
            query: id.or(title).unwrap_or_default().to_string(),
        })
}
