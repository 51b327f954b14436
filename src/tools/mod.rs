//! MCP tool implementations.

mod docs;
mod reference;
mod search;

// docs
pub use docs::{
    execute_doc_info, execute_get_section, execute_list_sections, execute_refresh,
    GetSectionInput, ListSectionsInput, ListSectionsOutput, RefreshOutput, SectionOutline,
};

// reference
pub use reference::{
    execute_function_docs, execute_list_functions, execute_sql_syntax, FunctionInput,
    ListFunctionsInput, ListFunctionsOutput, SqlSyntaxInput,
};

// search
pub use search::{
    execute_fuzzy_search, execute_search, FuzzyResultItem, FuzzySearchInput, FuzzySearchOutput,
    SearchInput, SearchOutput, SearchResultItem,
};
