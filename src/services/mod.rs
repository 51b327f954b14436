//! Core services: parsing, loading, searching and extraction.

mod cache;
pub mod extract;
mod fetch;
pub mod parser;
pub mod search;
mod store;

pub use cache::CacheMedium;
pub use extract::{find_function, find_sql_syntax, list_functions, FunctionDoc, SqlSyntaxDoc};
pub use fetch::{Fetcher, HttpFetcher};
pub use parser::parse_sections;
pub use search::{fuzzy_search, search, FuzzyHit, SearchHit, SearchMode};
pub use store::{DocStore, SectionView, StoreConfig, DEFAULT_SOURCE, DEFAULT_TTL};
