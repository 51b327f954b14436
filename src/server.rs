//! MCP server implementation using rmcp.

use crate::db::DocCache;
use crate::services::{DocStore, HttpFetcher, StoreConfig};
use crate::tools;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Maximum response size in bytes. Responses exceeding this are truncated
/// to prevent context window exhaustion in LLM consumers.
const MAX_RESPONSE_BYTES: usize = 512 * 1024; // 512KB

/// Truncates a JSON response string at a clean boundary before the limit,
/// appending a truncation notice. Works with both compact and pretty JSON.
fn truncate_response(mut json: String) -> String {
    if json.len() <= MAX_RESPONSE_BYTES {
        return json;
    }
    let original_len = json.len();
    // Find clean cut: last comma (JSON record boundary), then newline, then byte limit
    let search_region = &json[..json.floor_char_boundary(MAX_RESPONSE_BYTES)];
    let cut_point = search_region
        .rfind(',')
        .or_else(|| search_region.rfind('\n'))
        .unwrap_or(search_region.len());
    let safe_cut = json.floor_char_boundary(cut_point + 1);
    json.truncate(safe_cut);
    json.push_str(&format!(
        "...\n[TRUNCATED: response exceeded {} bytes, showing first {}]",
        original_len, safe_cut
    ));
    json
}

/// Helper to run a blocking tool operation and return structured MCP results.
///
/// Uses `spawn_blocking()` for store access and returns either:
/// - `CallToolResult::success()` with JSON content for success
/// - `CallToolResult::error()` with error details for tool errors
/// - `McpError::internal_error()` for panics/JoinErrors
async fn run_tool<T, E, F>(name: &'static str, f: F) -> Result<CallToolResult, McpError>
where
    T: Serialize + Send + 'static,
    E: std::fmt::Display + Send + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    let start = std::time::Instant::now();
    let result = tokio::task::spawn_blocking(f).await;

    match result {
        Ok(Ok(output)) => {
            let json = serde_json::to_string(&output)
                .map_err(|e| McpError::from(crate::ServerError::from(e)))?;
            let json = truncate_response(json);
            tracing::debug!("[{}] {:?} | {} bytes", name, start.elapsed(), json.len());
            Ok(CallToolResult::success(vec![Content::text(json)]))
        }
        Ok(Err(e)) => {
            tracing::debug!("[{}] {:?} | error: {}", name, start.elapsed(), e);
            Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
        }
        Err(e) => Err(McpError::internal_error(e.to_string(), None)),
    }
}

/// Opens the on-disk cache and builds a store over the HTTP fetcher.
///
/// Creates the cache directory if needed. The store is returned unloaded.
///
/// # Errors
///
/// Returns `ServerError::Config` for an empty source, `ServerError::Io` if
/// the cache directory cannot be created and `ServerError::Cache` /
/// `ServerError::Fetch` if the cache or HTTP client cannot be set up.
pub fn open_store(config: StoreConfig, cache_path: &Path) -> crate::Result<DocStore> {
    if config.source.trim().is_empty() {
        return Err(crate::ServerError::Config(
            "documentation source must not be empty".to_string(),
        ));
    }
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let cache = Arc::new(DocCache::open(cache_path)?);
    let fetcher = Arc::new(HttpFetcher::new()?);
    Ok(DocStore::new(config, fetcher, cache))
}

/// MCP server for the DuckDB documentation.
#[derive(Clone)]
pub struct DocsServer {
    store: Arc<DocStore>,
    tool_router: ToolRouter<Self>,
}

impl DocsServer {
    /// Creates a server over `store`. The store may still be unloaded.
    pub fn new(store: Arc<DocStore>) -> Self {
        Self {
            store,
            tool_router: Self::tool_router(),
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<DocStore> {
        &self.store
    }

    /// Loads the documentation in the background.
    ///
    /// Tools answer from an empty document until the load completes; a
    /// failed load is logged and leaves the store unloaded.
    pub fn spawn_initialize(&self) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = store.initialize() {
                tracing::warn!(
                    "Initial documentation load failed ({}): {}. Call refresh_docs to retry.",
                    e.code(),
                    e
                );
            }
        })
    }
}

#[tool_router]
impl DocsServer {
    /// Report what is loaded.
    #[tool(description = "Show the documentation source, cache location, last update time, section count and whether the documentation is loaded.")]
    async fn get_doc_info(&self) -> Result<CallToolResult, McpError> {
        let store = Arc::clone(&self.store);
        run_tool("get_doc_info", move || {
            Ok::<_, crate::ServerError>(tools::execute_doc_info(&store))
        })
        .await
    }

    /// Refetch the documentation.
    #[tool(description = "Fetch the documentation again, bypassing the cache.\n\nOn failure the previously loaded documentation stays available.")]
    async fn refresh_docs(&self) -> Result<CallToolResult, McpError> {
        let store = Arc::clone(&self.store);
        run_tool("refresh_docs", move || tools::execute_refresh(&store)).await
    }

    /// Outline of the heading hierarchy.
    #[tool(description = "List documentation sections (id, title, level, parent, line span).\n\nExamples: level=1 for top-level chapters, parent_id='functions' for its subsections\n\nTip: Use 'get_section' with an id from this list to read the section.")]
    async fn list_sections(
        &self,
        Parameters(input): Parameters<tools::ListSectionsInput>,
    ) -> Result<CallToolResult, McpError> {
        let store = Arc::clone(&self.store);
        run_tool("list_sections", move || {
            Ok::<_, crate::ServerError>(tools::execute_list_sections(&store, input))
        })
        .await
    }

    /// Read one section.
    #[tool(description = "Get the full content of one section by exact id or by title substring.\n\nExamples: id='select', title='window functions', include_children=true")]
    async fn get_section(
        &self,
        Parameters(input): Parameters<tools::GetSectionInput>,
    ) -> Result<CallToolResult, McpError> {
        let store = Arc::clone(&self.store);
        run_tool("get_section", move || tools::execute_get_section(&store, input)).await
    }

    /// Keyword search.
    #[tool(description = "Case-insensitive keyword search over section titles and content.\n\nModes: all (default), title, content. Title matches score 10, content matches 5.\n\nTip: Use 'fuzzy_search' if you are unsure of the spelling.")]
    async fn search_docs(
        &self,
        Parameters(input): Parameters<tools::SearchInput>,
    ) -> Result<CallToolResult, McpError> {
        let store = Arc::clone(&self.store);
        run_tool("search_docs", move || tools::execute_search(&store, input)).await
    }

    /// Typo-tolerant search.
    #[tool(description = "Fuzzy search that tolerates typos and partial words.\n\nExamples: 'parqet', 'strftm', 'windw func'")]
    async fn fuzzy_search(
        &self,
        Parameters(input): Parameters<tools::FuzzySearchInput>,
    ) -> Result<CallToolResult, McpError> {
        let store = Arc::clone(&self.store);
        run_tool("fuzzy_search", move || tools::execute_fuzzy_search(&store, input)).await
    }

    /// Function reference lookup.
    #[tool(description = "Get documentation for a SQL function: signature, parameters, return type and description.\n\nExamples: name='read_csv', name='date_trunc'")]
    async fn get_function_docs(
        &self,
        Parameters(input): Parameters<tools::FunctionInput>,
    ) -> Result<CallToolResult, McpError> {
        let store = Arc::clone(&self.store);
        run_tool("get_function_docs", move || {
            tools::execute_function_docs(&store, input)
        })
        .await
    }

    /// Function name listing.
    #[tool(description = "List function names mentioned in the documentation, sorted.\n\nExamples: prefix='list_', prefix='str'")]
    async fn list_functions(
        &self,
        Parameters(input): Parameters<tools::ListFunctionsInput>,
    ) -> Result<CallToolResult, McpError> {
        let store = Arc::clone(&self.store);
        run_tool("list_functions", move || {
            Ok::<_, crate::ServerError>(tools::execute_list_functions(&store, input))
        })
        .await
    }

    /// SQL statement syntax lookup.
    #[tool(description = "Get the syntax of a SQL statement or clause.\n\nExamples: 'CREATE TABLE', 'copy', 'window functions'")]
    async fn get_sql_syntax(
        &self,
        Parameters(input): Parameters<tools::SqlSyntaxInput>,
    ) -> Result<CallToolResult, McpError> {
        let store = Arc::clone(&self.store);
        run_tool("get_sql_syntax", move || tools::execute_sql_syntax(&store, input)).await
    }
}

#[tool_handler]
impl ServerHandler for DocsServer {
    fn get_info(&self) -> ServerInfo {
        let status = if self.store.is_loaded() {
            "STATUS: Documentation loaded."
        } else {
            "STATUS: Documentation is still loading (or failed to load). \
             Results are empty until it is ready; call 'refresh_docs' to retry."
        };

        let instructions = format!(
            "duckdocs: Navigate and search the DuckDB documentation.\n\n\
             {status}\n\n\
             WORKFLOW:\n\
             1. search_docs/fuzzy_search -> find sections\n\
             2. get_section -> read a section (include_children for subsections)\n\
             3. list_sections -> browse the outline\n\
             4. refresh_docs -> pull the latest documentation\n\n\
             REFERENCE:\n\
             - get_function_docs / list_functions for SQL functions\n\
             - get_sql_syntax for statements like CREATE TABLE or COPY\n\
             - get_doc_info to check what is loaded"
        );

        ServerInfo {
            instructions: Some(instructions),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<DocsServer>();
};
