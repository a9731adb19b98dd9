// ABOUTME: Error types for the harvest pipeline including the ErrorCode enum and HarvestError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the categories of harvest failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Fetch,
    Timeout,
    Ssrf,
    Parse,
    ContentTooShort,
    CrawlFailed,
    NotFound,
    Store,
    Config,
    Rewrite,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Ssrf => "SSRF blocked",
            ErrorCode::Parse => "markup could not be parsed",
            ErrorCode::ContentTooShort => "content too short",
            ErrorCode::CrawlFailed => "crawl failed",
            ErrorCode::NotFound => "not found",
            ErrorCode::Store => "store error",
            ErrorCode::Config => "configuration error",
            ErrorCode::Rewrite => "rewrite error",
        };
        write!(f, "{}", s)
    }
}

/// The error type shared by every harvest operation.
///
/// `url` names the page the failure belongs to (empty when the failure is not
/// tied to a page) and `op` the operation that raised it.
#[derive(Debug, thiserror::Error)]
pub struct HarvestError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for HarvestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.url.is_empty() {
            write!(f, "harvest: {}: {}", self.op, self.code)?;
        } else {
            write!(f, "harvest: {} {}: {}", self.op, self.url, self.code)?;
        }
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl HarvestError {
    fn with_code(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Fetch, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Timeout, url, op, source)
    }

    /// Create an SSRF error.
    pub fn ssrf(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Ssrf, url, op, source)
    }

    /// Create a Parse error.
    pub fn parse(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Parse, url, op, source)
    }

    /// Create a ContentTooShort error carrying the rejected length.
    pub fn content_too_short(url: impl Into<String>, op: impl Into<String>, len: usize) -> Self {
        Self::with_code(
            ErrorCode::ContentTooShort,
            url,
            op,
            Some(anyhow::anyhow!("{} characters after sanitization", len)),
        )
    }

    /// Create a CrawlFailed error.
    pub fn crawl_failed(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::CrawlFailed, url, op, source)
    }

    /// Create a NotFound error for a missing store record.
    pub fn not_found(op: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::with_code(
            ErrorCode::NotFound,
            String::new(),
            op,
            Some(anyhow::anyhow!("no record with id {}", id)),
        )
    }

    /// Create a Store error.
    pub fn store(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::with_code(ErrorCode::Store, String::new(), op, source)
    }

    /// Create a Config error.
    pub fn config(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::with_code(ErrorCode::Config, String::new(), op, source)
    }

    /// Create a Rewrite error.
    pub fn rewrite(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Rewrite, url, op, source)
    }

    /// Attaches the page URL to an error raised before it was known.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        if self.url.is_empty() {
            self.url = url.into();
        }
        self
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is an SSRF error.
    pub fn is_ssrf(&self) -> bool {
        self.code == ErrorCode::Ssrf
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        self.code == ErrorCode::Parse
    }

    /// Returns true if the sanitizer rejected the content.
    pub fn is_content_too_short(&self) -> bool {
        self.code == ErrorCode::ContentTooShort
    }

    /// Returns true if the crawl could not start.
    pub fn is_crawl_failed(&self) -> bool {
        self.code == ErrorCode::CrawlFailed
    }

    /// Returns true if a store lookup found nothing.
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true for failures that only cost a single URL during a crawl.
    pub fn is_per_url(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidUrl
                | ErrorCode::Fetch
                | ErrorCode::Timeout
                | ErrorCode::Ssrf
                | ErrorCode::Parse
                | ErrorCode::ContentTooShort
        )
    }
}
