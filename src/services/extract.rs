//! Best-effort extraction of structured reference data from prose.
//!
//! Everything here is pattern matching over semi-structured markdown.
//! Lookups return `Option`; individual fields that cannot be found come
//! back as `None` or empty, never as errors.

use crate::types::Section;
use rayon::prelude::*;
use regex::Regex;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Fenced code block, optionally language-tagged. Group 1 is the body.
static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```[\w+-]*[^\S\n]*\n(.*?)```").ok());

/// Single-backtick inline code span. Group 1 is the code.
static INLINE_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").ok());

/// A call expression such as `read_csv(path, ...)`.
static CALL_LIKE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*\s*\(.*\)").ok());

/// First cell of a markdown table row. Group 1 is the identifier.
static TABLE_ROW_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\|\s*`?([A-Za-z_][A-Za-z0-9_]*)`?\s*\|").ok());

/// Capitalized type named after a "returns" phrase.
static RETURNS_PHRASE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:[Rr]eturns?|RETURNS)(?:\s+(?:an?|the))?\s+`?([A-Z][A-Za-z0-9_\[\]]*)").ok()
});

/// Capitalized type named after an arrow.
static RETURNS_ARROW: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:->|=>|→)\s*`?([A-Z][A-Za-z0-9_\[\]]*)").ok());

/// Function-call-looking token: `name(` or `` `name`( ``.
static FUNCTION_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"`?([A-Za-z_][A-Za-z0-9_]*)`?\(").ok());

/// Table header words that are not parameter names.
const PARAMETER_HEADERS: &[&str] = &[
    "name",
    "parameter",
    "parameters",
    "argument",
    "arguments",
    "option",
    "options",
    "setting",
    "function",
    "column",
];

/// Call-looking tokens that are SQL syntax or prose, not functions.
const FUNCTION_STOPWORDS: &[&str] = &[
    "and", "as", "between", "by", "case", "cast", "check", "create", "default", "delete", "else",
    "end", "exists", "filter", "for", "from", "group", "having", "if", "in", "insert", "into",
    "join", "key", "like", "limit", "not", "null", "on", "or", "order", "over", "partition",
    "primary", "references", "returns", "select", "set", "table", "then", "union", "unique",
    "update", "using", "values", "when", "where", "while", "with", "within",
];

/// SQL statement keywords, most specific first.
const SQL_KEYWORDS: &[&str] = &[
    "create table",
    "create view",
    "create index",
    "create macro",
    "create sequence",
    "create schema",
    "create type",
    "create secret",
    "create",
    "alter table",
    "alter",
    "drop",
    "insert",
    "update",
    "delete",
    "merge into",
    "select",
    "copy",
    "attach",
    "detach",
    "export database",
    "import database",
    "unpivot",
    "pivot",
    "describe",
    "summarize",
    "explain",
    "reset",
    "set",
    "use",
    "vacuum",
    "checkpoint",
    "install",
    "load",
    "call",
    "pragma",
    "begin",
    "commit",
    "rollback",
    "with",
    "group by",
    "order by",
    "having",
    "qualify",
    "window",
    "limit",
    "where",
    "join",
    "union",
    "sample",
    "values",
];

/// Words in a title that mark a section as syntax reference.
const SYNTAX_TITLE_MARKERS: &[&str] = &["statement", "syntax", "clause"];

/// Returned when a syntax section has no matching code block.
pub const SYNTAX_PLACEHOLDER: &str = "See the description for syntax details.";

/// Reference documentation extracted for one function.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FunctionDoc {
    pub name: String,
    /// First call-like code found in the section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub description: String,
    /// Parameter names from table rows, in order
    pub parameters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    pub section_id: String,
}

/// Syntax reference extracted for one SQL statement.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SqlSyntaxDoc {
    pub statement: String,
    pub syntax: String,
    pub description: String,
    pub section_id: String,
}

/// Finds the documentation section for a function and extracts its
/// reference fields.
///
/// Title matches win over content mentions; the first match in document
/// order is used.
#[must_use]
pub fn find_function(sections: &[Section], name: &str) -> Option<FunctionDoc> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }
    let spaced = name.replace('_', " ");

    let by_title = sections.iter().find(|s| {
        let title = s.title.to_lowercase();
        title.contains(&name) || title.contains(&spaced)
    });

    let section = by_title.or_else(|| {
        let call = format!("{name}(");
        let quoted = format!("`{name}`");
        sections.iter().find(|s| {
            let content = s.content.to_lowercase();
            content.contains(&call) || content.contains(&quoted)
        })
    })?;

    Some(FunctionDoc {
        signature: extract_signature(&section.content),
        description: section.content.clone(),
        parameters: extract_parameters(&section.content),
        return_type: extract_return_type(&section.content),
        section_id: section.id.clone(),
        name,
    })
}

/// First fenced-block line or inline code span that looks like a call.
#[must_use]
pub fn extract_signature(content: &str) -> Option<String> {
    let call_like = CALL_LIKE.as_ref()?;

    let from_blocks = FENCED_BLOCK.as_ref().and_then(|re| {
        re.captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .flat_map(|body| body.as_str().lines())
            .map(str::trim)
            .find(|line| call_like.is_match(line))
    });

    let from_inline = || {
        INLINE_CODE.as_ref().and_then(|re| {
            re.captures_iter(content)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().trim())
                .find(|code| call_like.is_match(code))
        })
    };

    from_blocks.or_else(from_inline).map(str::to_string)
}

/// Parameter names from the first cell of `| name | ... |` table rows.
#[must_use]
pub fn extract_parameters(content: &str) -> Vec<String> {
    let Some(re) = TABLE_ROW_NAME.as_ref() else {
        return Vec::new();
    };

    let mut params: Vec<String> = Vec::new();
    for caps in re.captures_iter(content) {
        let Some(name) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if PARAMETER_HEADERS.contains(&name.to_lowercase().as_str()) {
            continue;
        }
        if !params.iter().any(|p| p == name) {
            params.push(name.to_string());
        }
    }
    params
}

/// Capitalized type after "returns ..." or an arrow.
#[must_use]
pub fn extract_return_type(content: &str) -> Option<String> {
    [&RETURNS_PHRASE, &RETURNS_ARROW]
        .into_iter()
        .filter_map(|re| re.as_ref())
        .find_map(|re| re.captures(content)?.get(1).map(|m| m.as_str().to_string()))
}

/// Harvests function names mentioned as calls anywhere in the document.
///
/// Names are lowercased, deduplicated and sorted; stopwords and names of
/// two characters or fewer are dropped.
#[must_use]
pub fn list_functions(sections: &[Section]) -> Vec<String> {
    let Some(re) = FUNCTION_TOKEN.as_ref() else {
        return Vec::new();
    };

    let names: BTreeSet<String> = sections
        .par_iter()
        .flat_map_iter(|section| {
            re.captures_iter(&section.content)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_lowercase())
                .collect::<Vec<_>>()
        })
        .filter(|name| name.chars().count() > 2 && !FUNCTION_STOPWORDS.contains(&name.as_str()))
        .collect();

    names.into_iter().collect()
}

/// Maps free text to the first known SQL keyword it contains.
#[must_use]
pub fn normalize_statement(statement: &str) -> String {
    let lowered = statement.trim().to_lowercase();
    SQL_KEYWORDS
        .iter()
        .find(|kw| lowered.contains(*kw))
        .map_or(lowered.clone(), |kw| (*kw).to_string())
}

/// Finds the syntax reference for a SQL statement.
///
/// Prefers a section whose title names the keyword and is either marked
/// as syntax reference or is a top-level (level 1-2) heading; falls back
/// to a section whose content mentions the keyword and "syntax".
#[must_use]
pub fn find_sql_syntax(sections: &[Section], statement: &str) -> Option<SqlSyntaxDoc> {
    let keyword = normalize_statement(statement);
    if keyword.is_empty() {
        return None;
    }

    let by_title = sections.iter().find(|s| {
        let title = s.title.to_lowercase();
        title.contains(&keyword)
            && (SYNTAX_TITLE_MARKERS.iter().any(|m| title.contains(m)) || s.level <= 2)
    });

    let section = by_title.or_else(|| {
        let mention = format!("{keyword} ");
        sections.iter().find(|s| {
            let content = s.content.to_lowercase();
            content.contains(&mention) && content.contains("syntax")
        })
    })?;

    let syntax = extract_syntax_block(&section.content, &keyword)
        .unwrap_or_else(|| SYNTAX_PLACEHOLDER.to_string());

    Some(SqlSyntaxDoc {
        statement: keyword.to_uppercase(),
        syntax,
        description: section.content.clone(),
        section_id: section.id.clone(),
    })
}

/// First fenced block whose body mentions `keyword`, trimmed.
#[must_use]
pub fn extract_syntax_block(content: &str, keyword: &str) -> Option<String> {
    let re = FENCED_BLOCK.as_ref()?;
    re.captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|body| body.as_str())
        .find(|body| body.to_lowercase().contains(keyword))
        .map(|body| body.trim().to_string())
}
