//! duckdocs: MCP server for the DuckDB documentation.
//!
//! Usage:
//!   duckdocs --mcp                    # Start MCP server on stdio
//!   duckdocs search <query>           # CLI search mode
//!   duckdocs section --id select      # Print one section
//!   duckdocs completions zsh          # Shell completions

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use duckdocs::services::{SearchMode, StoreConfig, DEFAULT_SOURCE};
use duckdocs::server::{open_store, DocsServer};
use duckdocs::{fmt, tools};
use rmcp::ServiceExt;
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duckdocs")]
#[command(about = "MCP server for navigating and searching the DuckDB documentation")]
#[command(version)]
struct Cli {
    /// Run as MCP server (stdin/stdout JSON-RPC)
    #[arg(long)]
    mcp: bool,

    /// Documentation URL or local path
    #[arg(long, default_value = DEFAULT_SOURCE)]
    source: String,

    /// Cache database path (default: ~/.cache/duckdocs/docs.db)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Hours a cached copy stays valid
    #[arg(long, default_value = "24")]
    ttl_hours: u64,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what is loaded
    Info,

    /// Refetch the documentation, bypassing the cache
    Refresh,

    /// List sections
    Sections {
        /// Only this heading level (1-6)
        #[arg(short, long)]
        level: Option<u8>,

        /// Only direct children of this section id
        #[arg(short, long)]
        parent: Option<String>,

        /// Maximum sections
        #[arg(long, default_value = "200")]
        limit: usize,
    },

    /// Print one section
    Section {
        /// Exact section id
        #[arg(long)]
        id: Option<String>,

        /// Title substring
        #[arg(long)]
        title: Option<String>,

        /// Include direct subsections
        #[arg(short, long)]
        children: bool,
    },

    /// Keyword search
    Search {
        /// Search query
        query: String,

        /// Search mode: title, content, or all
        #[arg(short, long, default_value = "all")]
        mode: String,

        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Typo-tolerant search
    Fuzzy {
        /// Approximate query
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show documentation for a function
    Function {
        /// Function name
        name: String,
    },

    /// List function names
    Functions {
        /// Only names with this prefix
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Show the syntax of a SQL statement
    Syntax {
        /// Statement, e.g. "CREATE TABLE"
        statement: String,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // CRITICAL: Log to stderr only (stdout is JSON-RPC for MCP)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("duckdocs=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = StoreConfig::for_source(cli.source.clone())
        .with_ttl(Duration::from_secs(cli.ttl_hours.saturating_mul(3600)));
    let cache_path = cli.cache.clone().unwrap_or_else(duckdocs::default_cache_path);

    if cli.mcp {
        run_mcp_server(config, cache_path).await
    } else if let Some(cmd) = cli.command {
        run_cli(config, cache_path, cmd, cli.json).await
    } else {
        // Default: show help
        eprintln!("Use --mcp to start MCP server, or a subcommand for CLI mode.");
        eprintln!("Run with --help for more information.");
        std::process::exit(1);
    }
}

async fn run_mcp_server(config: StoreConfig, cache_path: PathBuf) -> anyhow::Result<()> {
    tracing::info!(
        "Starting MCP server for {} (cache: {})",
        config.source,
        cache_path.display()
    );

    let store = Arc::new(open_store(config, &cache_path)?);
    let server = DocsServer::new(store);
    server.spawn_initialize();

    // Run the MCP server on stdin/stdout
    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}

/// Prints `value` as pretty JSON or through the given formatter.
fn emit<T: Serialize>(
    value: &T,
    json: bool,
    format: impl FnOnce(&mut std::io::StdoutLock<'static>, &T, bool) -> std::io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    } else {
        let color = std::io::stdout().is_terminal();
        format(&mut out, value, color)?;
    }
    Ok(())
}

async fn run_cli(
    config: StoreConfig,
    cache_path: PathBuf,
    cmd: Commands,
    json: bool,
) -> anyhow::Result<()> {
    if let Commands::Completions { shell } = cmd {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "duckdocs", &mut std::io::stdout());
        return Ok(());
    }

    let store = Arc::new(
        open_store(config, &cache_path)
            .with_context(|| format!("opening cache at {}", cache_path.display()))?,
    );

    // Fetching and parsing are blocking
    let loader = Arc::clone(&store);
    let is_refresh = matches!(cmd, Commands::Refresh);
    tokio::task::spawn_blocking(move || {
        if is_refresh {
            Ok(())
        } else {
            loader.initialize()
        }
    })
    .await??;

    match cmd {
        Commands::Info => {
            let info = tools::execute_doc_info(&store);
            emit(&info, json, |w, v, c| fmt::fmt_info(w, v, c))?;
        }

        Commands::Refresh => {
            let refresher = Arc::clone(&store);
            let result = tokio::task::spawn_blocking(move || tools::execute_refresh(&refresher))
                .await?
                .map_err(|e| anyhow::anyhow!(e))?;
            emit(&result, json, |w, v, _| fmt::fmt_refresh(w, v))?;
        }

        Commands::Sections {
            level,
            parent,
            limit,
        } => {
            let input = tools::ListSectionsInput {
                level,
                parent_id: parent,
                limit,
            };
            let result = tools::execute_list_sections(&store, input);
            emit(&result, json, |w, v, c| fmt::fmt_sections(w, v, c))?;
        }

        Commands::Section {
            id,
            title,
            children,
        } => {
            let input = tools::GetSectionInput {
                id,
                title,
                include_children: children,
            };
            let result =
                tools::execute_get_section(&store, input).map_err(|e| anyhow::anyhow!(e))?;
            emit(&result, json, |w, v, c| fmt::fmt_section(w, v, c))?;
        }

        Commands::Search { query, mode, limit } => {
            let mode: SearchMode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let input = tools::SearchInput { query, mode, limit };
            let result = tools::execute_search(&store, input).map_err(|e| anyhow::anyhow!(e))?;
            emit(&result, json, |w, v, c| fmt::fmt_search(w, v, c))?;
        }

        Commands::Fuzzy { query, limit } => {
            let input = tools::FuzzySearchInput { query, limit };
            let result =
                tools::execute_fuzzy_search(&store, input).map_err(|e| anyhow::anyhow!(e))?;
            emit(&result, json, |w, v, c| fmt::fmt_fuzzy(w, v, c))?;
        }

        Commands::Function { name } => {
            let input = tools::FunctionInput { name };
            let result =
                tools::execute_function_docs(&store, input).map_err(|e| anyhow::anyhow!(e))?;
            emit(&result, json, |w, v, c| fmt::fmt_function(w, v, c))?;
        }

        Commands::Functions { prefix } => {
            let input = tools::ListFunctionsInput { prefix };
            let result = tools::execute_list_functions(&store, input);
            emit(&result, json, |w, v, _| fmt::fmt_functions(w, v))?;
        }

        Commands::Syntax { statement } => {
            let input = tools::SqlSyntaxInput { statement };
            let result =
                tools::execute_sql_syntax(&store, input).map_err(|e| anyhow::anyhow!(e))?;
            emit(&result, json, |w, v, c| fmt::fmt_syntax(w, v, c))?;
        }

        // Handled before the store is opened
        Commands::Completions { .. } => {}
    }

    Ok(())
}
