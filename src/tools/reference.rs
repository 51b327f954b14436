//! Reference lookup MCP tools: functions and SQL statement syntax.

use super::search::require_query;
use crate::error::{Result, ServerError};
use crate::services::{find_function, find_sql_syntax, list_functions, DocStore, FunctionDoc, SqlSyntaxDoc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input for the function docs tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FunctionInput {
    /// Function name, e.g. "read_csv" or "date_trunc"
    pub name: String,
}

/// Executes the function docs tool.
///
/// # Errors
///
/// Returns `ServerError::Tool` for an empty name and
/// `ServerError::SectionNotFound` if no section documents the function.
pub fn execute_function_docs(store: &DocStore, input: FunctionInput) -> Result<FunctionDoc> {
    let name = require_query(&input.name)?;
    let tree = store.all_sections();

    find_function(tree.sections(), name).ok_or_else(|| ServerError::SectionNotFound {
        query: name.to_string(),
    })
}

/// Input for the list functions tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListFunctionsInput {
    /// Only names starting with this prefix (case-insensitive)
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Output for the list functions tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListFunctionsOutput {
    /// Sorted, deduplicated function names
    pub functions: Vec<String>,
    pub total: usize,
}

/// Executes the list functions tool.
#[must_use]
pub fn execute_list_functions(store: &DocStore, input: ListFunctionsInput) -> ListFunctionsOutput {
    let tree = store.all_sections();
    let prefix = input
        .prefix
        .as_deref()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty());

    let functions: Vec<String> = list_functions(tree.sections())
        .into_iter()
        .filter(|name| prefix.as_deref().is_none_or(|p| name.starts_with(p)))
        .collect();

    ListFunctionsOutput {
        total: functions.len(),
        functions,
    }
}

/// Input for the SQL syntax tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SqlSyntaxInput {
    /// Statement or clause, e.g. "CREATE TABLE", "copy", "window functions"
    pub statement: String,
}

/// Executes the SQL syntax tool.
///
/// # Errors
///
/// Returns `ServerError::Tool` for an empty statement and
/// `ServerError::SectionNotFound` if no syntax section is found.
pub fn execute_sql_syntax(store: &DocStore, input: SqlSyntaxInput) -> Result<SqlSyntaxDoc> {
    let statement = require_query(&input.statement)?;
    let tree = store.all_sections();

    find_sql_syntax(tree.sections(), statement).ok_or_else(|| ServerError::SectionNotFound {
        query: statement.to_string(),
    })
}
