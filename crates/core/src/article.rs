// ABOUTME: The ExtractedArticle value object produced by the pipeline for each source URL.
// ABOUTME: Also derives URL slugs from the last non-empty path segment.

use serde::{Deserialize, Serialize};
use url::Url;

/// A cleaned article extracted from one detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub title: String,
    /// Absolute URL of the detail page; the natural key for dedupe and upsert.
    pub source_url: String,
    pub slug: String,
    /// Sanitized HTML fragment.
    pub content: String,
    pub published_date: String,
}

/// Last non-empty path segment of `url`, or its host when the path is empty.
///
/// Unparseable input falls back to the last non-empty `/`-separated piece of
/// the raw string.
pub fn slug_from_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let segment = parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string);
            segment
                .or_else(|| parsed.host_str().map(str::to_string))
                .unwrap_or_default()
        }
        Err(_) => url
            .split('/')
            .filter(|s| !s.is_empty())
            .last()
            .unwrap_or_default()
            .to_string(),
    }
}
