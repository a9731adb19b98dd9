// ABOUTME: Post-processing sanitizer applied to every extracted candidate body.
// ABOUTME: Re-parses the fragment, removes the second denylist, runs an ammonia allow-list and enforces a minimum length.

use std::collections::HashSet;

use dom_query::{Document, Selection};
use tracing::debug;

use crate::dom::noise::NoiseStripper;
use crate::error::HarvestError;
use crate::profile::SiteProfile;

/// Sanitized bodies shorter than this are rejected.
pub const MIN_CONTENT_CHARS: usize = 100;

const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "hr", "strong", "b", "em", "i", "u", "h1", "h2", "h3", "h4", "h5", "h6", "ul",
    "ol", "li", "blockquote", "pre", "code", "img", "a", "span", "div", "figure", "figcaption",
    "table", "thead", "tbody", "tr", "th", "td",
];

fn clean_html(html: &str) -> String {
    let mut builder = ammonia::Builder::new();
    builder.tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>());
    builder.add_tag_attributes("a", &["href"]);
    builder.add_tag_attributes("img", &["src", "alt", "width", "height"]);
    builder
        .link_rel(None)
        .url_schemes(["http", "https", "mailto"].iter().copied().collect())
        .clean(html)
        .to_string()
}

/// Produces the final article body from a candidate fragment.
///
/// The returned URL-less error is tagged with the page URL by the caller.
pub fn finalize(fragment: &str, profile: &SiteProfile) -> Result<String, HarvestError> {
    let doc = Document::from(fragment);
    let body = doc.select("body").first();
    let root = if body.exists() {
        body
    } else {
        Selection::from(doc.root())
    };

    let removed = NoiseStripper::new(&profile.sanitize_rules).strip(&root);
    let inner = root.inner_html().to_string();
    let cleaned = clean_html(&inner);
    let content = cleaned.trim();

    let len = content.chars().count();
    debug!(removed, len, "sanitized fragment");
    if len < MIN_CONTENT_CHARS {
        return Err(HarvestError::content_too_short("", "Finalize", len));
    }
    Ok(content.to_string())
}
