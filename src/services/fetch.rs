//! Documentation source retrieval.
//!
//! The store only sees the [`Fetcher`] trait. [`HttpFetcher`] is the
//! production implementation: HTTP(S) URLs go over the network,
//! `file://` URLs and plain paths are read from disk.

use crate::error::{FetchError, FetchResult};
use reqwest::blocking::Client;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on a single fetch. The store itself imposes no timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Retrieves raw documentation text from a source location.
///
/// Implementations are blocking; async callers go through `spawn_blocking`.
pub trait Fetcher: Send + Sync {
    /// Fetches the full text at `location`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidSourceLocation` for locations that cannot
    /// be interpreted, `FetchError::FetchFailed` for transport failures and
    /// `FetchError::UndecodableContent` when the body is not UTF-8.
    fn fetch(&self, location: &str) -> FetchResult<String>;
}

/// Where a source location points.
#[derive(Debug, PartialEq, Eq)]
enum Source {
    Remote(Url),
    Local(PathBuf),
}

/// Fetches over HTTP(S) or from the local filesystem.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::FetchFailed` if the HTTP client cannot be built
    /// (e.g. TLS backend initialization fails).
    pub fn new() -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::FetchFailed {
                location: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    fn fetch_remote(&self, url: Url) -> FetchResult<String> {
        let location = url.to_string();
        let failed = |reason: String| FetchError::FetchFailed {
            location: location.clone(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP status {status}")));
        }

        let bytes = response.bytes().map_err(|e| failed(e.to_string()))?;
        decode(&location, bytes.to_vec())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, location: &str) -> FetchResult<String> {
        match classify_location(location)? {
            Source::Remote(url) => {
                tracing::debug!("Fetching documentation from {}", url);
                self.fetch_remote(url)
            }
            Source::Local(path) => {
                tracing::debug!("Reading documentation from {}", path.display());
                read_local(&path)
            }
        }
    }
}

/// Decides whether a location is a remote URL or a local path.
fn classify_location(location: &str) -> FetchResult<Source> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidSourceLocation(
            "source location is empty".to_string(),
        ));
    }

    if !trimmed.contains("://") {
        return Ok(Source::Local(PathBuf::from(trimmed)));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| FetchError::InvalidSourceLocation(format!("{trimmed}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(Source::Remote(url)),
        "file" => url
            .to_file_path()
            .map(Source::Local)
            .map_err(|()| FetchError::InvalidSourceLocation(format!("{trimmed}: not a file path"))),
        other => Err(FetchError::InvalidSourceLocation(format!(
            "{trimmed}: unsupported scheme '{other}'"
        ))),
    }
}

fn read_local(path: &Path) -> FetchResult<String> {
    let location = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| FetchError::FetchFailed {
        location: location.clone(),
        reason: e.to_string(),
    })?;
    decode(&location, bytes)
}

fn decode(location: &str, bytes: Vec<u8>) -> FetchResult<String> {
    String::from_utf8(bytes).map_err(|e| FetchError::UndecodableContent {
        location: location.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_classify_remote() {
        let source = classify_location("https://duckdb.org/duckdb-docs.md").unwrap();
        assert!(matches!(source, Source::Remote(_)));
    }

    #[test]
    fn test_classify_local_path() {
        let source = classify_location("docs/duckdb.md").unwrap();
        assert_eq!(source, Source::Local(PathBuf::from("docs/duckdb.md")));
    }

    #[test]
    fn test_classify_rejects_bad_locations() {
        assert!(matches!(
            classify_location("   "),
            Err(FetchError::InvalidSourceLocation(_))
        ));
        assert!(matches!(
            classify_location("ftp://example.com/docs.md"),
            Err(FetchError::InvalidSourceLocation(_))
        ));
        assert!(matches!(
            classify_location("http://[::1"),
            Err(FetchError::InvalidSourceLocation(_))
        ));
    }

    #[test]
    fn test_fetch_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs.md");
        std::fs::write(&path, "# Title\nbody").unwrap();

        let fetcher = HttpFetcher::new().unwrap();
        let text = fetcher.fetch(path.to_str().unwrap()).unwrap();
        assert_eq!(text, "# Title\nbody");
    }

    #[test]
    fn test_fetch_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.md");

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(path.to_str().unwrap()).unwrap_err();
        assert_eq!(err.code(), "FETCH_FAILED");
    }

    #[test]
    fn test_fetch_non_utf8_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, FetchError::UndecodableContent { .. }));
    }
}
