//! Keyword and fuzzy search over a section list.
//!
//! Stateless: every function takes the sections to search as input, so
//! callers can search a snapshot concurrently without synchronization.
//! Sorting is stable everywhere; equal scores keep document order.

use crate::types::{MatchField, Section};
use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score for a title match.
const TITLE_SCORE: u32 = 10;
/// Score for a content match.
const CONTENT_SCORE: u32 = 5;
/// Default snippet width around a match, in characters.
pub const SNIPPET_CONTEXT: usize = 100;

const ELLIPSIS: &str = "...";

/// Which parts of a section keyword search looks at.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Section titles only
    Title,
    /// Section bodies only
    Content,
    /// Titles and bodies
    #[default]
    All,
}

impl SearchMode {
    const fn includes_title(self) -> bool {
        matches!(self, Self::Title | Self::All)
    }

    const fn includes_content(self) -> bool {
        matches!(self, Self::Content | Self::All)
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Content => write!(f, "content"),
            Self::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "content" => Ok(Self::Content),
            "all" => Ok(Self::All),
            other => Err(format!(
                "Invalid search mode: '{}'. Valid modes: title, content, all",
                other
            )),
        }
    }
}

/// A keyword search hit.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchHit {
    pub section: Section,
    pub score: u32,
    /// Fields the query was found in
    pub matches: Vec<MatchField>,
    /// Excerpt of the content around the first match
    pub snippet: String,
}

/// A fuzzy search hit.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FuzzyHit {
    pub section: Section,
    pub score: f64,
    pub matched_in: MatchField,
}

/// Scores sections by case-insensitive substring matches on title and
/// content, best first.
#[must_use]
pub fn search(sections: &[Section], query: &str, mode: SearchMode, limit: usize) -> Vec<SearchHit> {
    let needle = query.to_lowercase();

    let mut scored: Vec<(&Section, u32, Vec<MatchField>)> = sections
        .iter()
        .filter_map(|section| {
            let mut score = 0;
            let mut matches = Vec::with_capacity(2);

            if mode.includes_title() && section.title.to_lowercase().contains(&needle) {
                score += TITLE_SCORE;
                matches.push(MatchField::Title);
            }
            if mode.includes_content() && section.content.to_lowercase().contains(&needle) {
                score += CONTENT_SCORE;
                matches.push(MatchField::Content);
            }

            (score > 0).then_some((section, score, matches))
        })
        .collect();

    // Stable: equal scores stay in document order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(limit);

    // Snippets only for surviving results
    scored
        .into_iter()
        .map(|(section, score, matches)| SearchHit {
            snippet: extract_snippet(&section.content, query, SNIPPET_CONTEXT),
            section: section.clone(),
            score,
            matches,
        })
        .collect()
}

/// Extracts an excerpt of `content` around the first case-insensitive
/// occurrence of `query`.
///
/// Without a match, returns the first `context_chars` characters followed
/// by an ellipsis. Offsets are in characters, so multi-byte text is never
/// split.
#[must_use]
pub fn extract_snippet(content: &str, query: &str, context_chars: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    let query_len = query.chars().count();

    let Some(start) = find_ci(&chars, query) else {
        let head: String = chars.iter().take(context_chars).collect();
        return format!("{head}{ELLIPSIS}");
    };

    let half = context_chars / 2;
    let from = start.saturating_sub(half);
    let to = (start + query_len + half).min(chars.len());

    let mut snippet = String::with_capacity((to - from) + 2 * ELLIPSIS.len());
    if from > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.extend(&chars[from..to]);
    if to < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// Character index of the first case-insensitive occurrence of `needle`.
fn find_ci(haystack: &[char], needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| {
        haystack[i..i + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(a, b)| chars_eq_ci(*a, *b))
    })
}

fn chars_eq_ci(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Typo-tolerant search: ordered-subsequence matching plus a bonus for
/// exact substrings. Content scores count half.
#[must_use]
pub fn fuzzy_search(sections: &[Section], query: &str, limit: usize) -> Vec<FuzzyHit> {
    // par_iter keeps input order on collect, so the sort below stays stable
    let mut hits: Vec<FuzzyHit> = sections
        .par_iter()
        .filter_map(|section| {
            let title_score = fuzzy_score(query, &section.title);
            let content_score = fuzzy_score(query, &section.content) / 2.0;

            let (score, matched_in) = if content_score > title_score {
                (content_score, MatchField::Content)
            } else {
                (title_score, MatchField::Title)
            };

            (score > 0.0).then(|| FuzzyHit {
                section: section.clone(),
                score,
                matched_in,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(limit);
    hits
}

/// Counts query characters found in order within `target`, plus
/// `2 * len(query)` when `target` contains `query` as a substring.
/// Case-insensitive.
#[must_use]
pub fn fuzzy_score(query: &str, target: &str) -> f64 {
    let query = query.to_lowercase();
    let target = target.to_lowercase();
    let query_chars: Vec<char> = query.chars().collect();
    if query_chars.is_empty() {
        return 0.0;
    }

    let mut matched = 0;
    for c in target.chars() {
        if matched < query_chars.len() && c == query_chars[matched] {
            matched += 1;
        }
    }

    let mut score = matched as f64;
    if target.contains(&query) {
        score += 2.0 * query_chars.len() as f64;
    }
    score
}
