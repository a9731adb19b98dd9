// ABOUTME: Listing page parsing: pagination depth detection and article link discovery.
// ABOUTME: Read-only scraper queries producing ListingEntry values with absolute URLs.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::dom::normalize_whitespace;
use crate::error::HarvestError;

/// An article link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Anchor text, whitespace-collapsed. May be empty.
    pub title: String,
    /// Absolute article URL.
    pub url: String,
}

fn compile(css: &str) -> Result<Selector, HarvestError> {
    Selector::parse(css).map_err(|e| {
        HarvestError::config(
            "CompileSelector",
            Some(anyhow::anyhow!("invalid selector {:?}: {}", css, e)),
        )
    })
}

/// Highest pagination label on the page, or 1 when none is numeric.
///
/// A label counts only when its trimmed text is entirely ASCII digits, so
/// "2 comments" or "Page 3" are ignored.
pub fn max_page(markup: &str, pagination_selector: &str) -> Result<u32, HarvestError> {
    let selector = compile(pagination_selector)?;
    let document = Html::parse_document(markup);
    let max = document
        .select(&selector)
        .filter_map(|el| {
            let label = el.text().collect::<String>();
            let label = label.trim();
            if label.is_empty() || !label.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            label.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(1);
    Ok(max.max(1))
}

/// Article links on a listing page, last in document order first.
///
/// Relative hrefs are resolved against `page_url`; anchors without an href or
/// with an unresolvable one are skipped.
pub fn listing_entries(
    markup: &str,
    page_url: &str,
    link_selector: &str,
) -> Result<Vec<ListingEntry>, HarvestError> {
    let selector = compile(link_selector)?;
    let base = Url::parse(page_url).ok();
    let document = Html::parse_document(markup);

    let mut entries: Vec<ListingEntry> = document
        .select(&selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            let url = match &base {
                Some(base) => base.join(href).ok()?.to_string(),
                None => Url::parse(href).ok()?.to_string(),
            };
            let title = normalize_whitespace(&el.text().collect::<String>());
            Some(ListingEntry { title, url })
        })
        .collect();
    entries.reverse();
    Ok(entries)
}
