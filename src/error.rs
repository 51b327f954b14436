//! Error types for duckdocs.
//!
//! Uses thiserror for ergonomic error handling with proper
//! error chain propagation.

use thiserror::Error;

/// Top-level server error.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No documentation section matches '{query}'")]
    SectionNotFound { query: String },

    #[error("Tool error: {0}")]
    Tool(String),
}

/// Errors raised while retrieving the documentation source.
///
/// These are the only errors the load path produces; parsing never fails.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid source location: {0}")]
    InvalidSourceLocation(String),

    #[error("Failed to fetch {location}: {reason}")]
    FetchFailed { location: String, reason: String },

    #[error("Content from {location} is not valid UTF-8: {reason}")]
    UndecodableContent { location: String, reason: String },
}

/// Document cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("No cached document for key: {key}")]
    Missing { key: String },
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

// Error code implementations for machine-readable error responses
impl ServerError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Fetch(e) => e.code(),
            Self::Cache(e) => e.code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::SectionNotFound { .. } => "SECTION_NOT_FOUND",
            Self::Tool(_) => "TOOL_ERROR",
        }
    }
}

impl FetchError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSourceLocation(_) => "INVALID_SOURCE_LOCATION",
            Self::FetchFailed { .. } => "FETCH_FAILED",
            Self::UndecodableContent { .. } => "UNDECODABLE_CONTENT",
        }
    }
}

impl CacheError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "SQLITE_ERROR",
            Self::Pool(_) => "POOL_ERROR",
            Self::Missing { .. } => "CACHE_MISS",
        }
    }
}

// Conversion to rmcp protocol errors
impl From<ServerError> for rmcp::ErrorData {
    fn from(err: ServerError) -> Self {
        rmcp::ErrorData::internal_error(err.to_string(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_codes_propagate() {
        let err: ServerError = FetchError::InvalidSourceLocation("::".into()).into();
        assert_eq!(err.code(), "INVALID_SOURCE_LOCATION");

        let err: ServerError = FetchError::FetchFailed {
            location: "https://example.com".into(),
            reason: "timeout".into(),
        }
        .into();
        assert_eq!(err.code(), "FETCH_FAILED");
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_section_not_found_message() {
        let err = ServerError::SectionNotFound {
            query: "read_csv".into(),
        };
        assert_eq!(err.code(), "SECTION_NOT_FOUND");
        assert!(err.to_string().contains("read_csv"));
    }
}
