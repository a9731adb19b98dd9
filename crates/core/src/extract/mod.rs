// ABOUTME: Extraction strategy chain and the per-URL article pipeline.
// ABOUTME: Evaluates the tiers in order, then sanitizes the winner into an ExtractedArticle.

//! Content extraction.
//!
//! [`extract`] drives the tier chain over one parsed page: the semantic tier
//! sees the untouched document, then the container is stripped of noise and
//! handed to the paragraph, raw-text and last-resort tiers in turn. The first
//! tier that accepts wins. [`extract_article`] wraps the chain with parsing,
//! date and title lookup, and sanitization.

pub mod date;
pub mod tiers;

use std::fmt;

use dom_query::{Document, Selection};
use tracing::debug;

use crate::article::{slug_from_url, ExtractedArticle};
use crate::dom::container::select_container;
use crate::dom::noise::NoiseStripper;
use crate::dom::{collapsed_text, parse};
use crate::error::HarvestError;
use crate::listing::ListingEntry;
use crate::profile::SiteProfile;
use crate::sanitize::finalize;

pub use tiers::TierOutcome;

/// The strategy that produced a candidate body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Semantic,
    Paragraphs,
    RawText,
    LastResort,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Semantic => "semantic",
            Tier::Paragraphs => "paragraphs",
            Tier::RawText => "raw-text",
            Tier::LastResort => "last-resort",
        };
        write!(f, "{}", s)
    }
}

/// The accepted candidate together with the container it was taken from.
pub struct ExtractionAttempt<'a> {
    pub container: Selection<'a>,
    pub content: String,
    pub tier: Tier,
}

impl fmt::Debug for ExtractionAttempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionAttempt")
            .field("tier", &self.tier)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

/// Runs the tier chain. Strips noise from `container` in place once the
/// semantic tier has rejected.
pub fn extract<'a>(
    doc: &'a Document,
    container: Selection<'a>,
    profile: &SiteProfile,
) -> Result<ExtractionAttempt<'a>, HarvestError> {
    if let TierOutcome::Accepted(content) = tiers::semantic(doc, &profile.content_selectors) {
        return Ok(ExtractionAttempt {
            container,
            content,
            tier: Tier::Semantic,
        });
    }

    let removed = NoiseStripper::new(&profile.noise_rules).strip(&container);
    debug!(removed, "stripped container");

    let chain: [(Tier, fn(&Selection) -> TierOutcome); 3] = [
        (Tier::Paragraphs, tiers::paragraphs),
        (Tier::RawText, tiers::raw_text),
        (Tier::LastResort, tiers::last_resort),
    ];
    for (tier, run) in chain {
        if let TierOutcome::Accepted(content) = run(&container) {
            return Ok(ExtractionAttempt {
                container,
                content,
                tier,
            });
        }
    }

    Err(HarvestError::content_too_short("", "Extract", 0))
}

/// Turns one detail page into an article, or explains why it was rejected.
pub fn extract_article(
    markup: &str,
    entry: &ListingEntry,
    profile: &SiteProfile,
) -> Result<ExtractedArticle, HarvestError> {
    let url = entry.url.as_str();
    let doc = parse(markup).map_err(|e| e.with_url(url))?;

    let published_date = date::published_date(&doc, &profile.date_selectors);
    let title = if entry.title.is_empty() {
        collapsed_text(&doc.select("h1").first())
    } else {
        entry.title.clone()
    };

    let container = select_container(&doc);
    let attempt = extract(&doc, container, profile).map_err(|e| e.with_url(url))?;
    debug!(url, tier = %attempt.tier, len = attempt.content.len(), "tier accepted");

    let content = finalize(&attempt.content, profile).map_err(|e| e.with_url(url))?;

    Ok(ExtractedArticle {
        title,
        source_url: entry.url.clone(),
        slug: slug_from_url(url),
        content,
        published_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> ListingEntry {
        ListingEntry {
            title: title.to_string(),
            url: "https://blog.test/blogs/hello-world/".to_string(),
        }
    }

    fn sentence(n: usize) -> String {
        format!(
            "Sentence number {} carries enough words to clear the paragraph threshold easily.",
            n
        )
    }

    #[test]
    fn chain_prefers_semantic_tier() {
        let html = format!(
            "<main><nav>Menu</nav><div class=\"entry-content\"><p>{}</p><p>{}</p><p>{}</p></div></main>",
            sentence(1),
            sentence(2),
            sentence(3)
        );
        let doc = parse(&html).unwrap();
        let attempt = extract(&doc, select_container(&doc), &SiteProfile::default()).unwrap();
        assert_eq!(attempt.tier, Tier::Semantic);
        assert!(attempt.container.is("main"));
    }

    #[test]
    fn chain_falls_to_paragraphs_after_stripping() {
        let html = format!(
            "<body><header><p>{}</p></header><div>{}</div><footer><p>{}</p></footer></body>",
            sentence(1),
            sentence(2),
            sentence(3)
        );
        let doc = parse(&html).unwrap();
        let attempt = extract(&doc, select_container(&doc), &SiteProfile::default()).unwrap();
        assert_eq!(attempt.tier, Tier::Paragraphs);
        assert_eq!(attempt.content, format!("<p>{}</p>", sentence(2)));
    }

    #[test]
    fn chain_uses_last_resort_for_markup_without_text() {
        let doc = parse(r#"<body><main><img src="https://img.test/a.png"></main></body>"#).unwrap();
        let attempt = extract(&doc, select_container(&doc), &SiteProfile::default()).unwrap();
        assert_eq!(attempt.tier, Tier::LastResort);
    }

    #[test]
    fn chain_fails_on_empty_container() {
        let doc = parse("<body><main><nav>Home</nav></main></body>").unwrap();
        let err = extract(&doc, select_container(&doc), &SiteProfile::default()).unwrap_err();
        assert!(err.is_content_too_short());
    }

    #[test]
    fn article_pipeline_fills_every_field() {
        let html = format!(
            "<html><body><header><h1>Hello World</h1><time>Jan 2, 2024</time></header>\
             <main><div class=\"entry-content\"><p>{}</p><p>{}</p><p>{}</p>\
             <div class=\"sharedaddy\">Share</div></div></main></body></html>",
            sentence(1),
            sentence(2),
            sentence(3)
        );
        let article = extract_article(&html, &entry(""), &SiteProfile::default()).unwrap();

        assert_eq!(article.title, "Hello World");
        assert_eq!(article.slug, "hello-world");
        assert_eq!(article.published_date, "Jan 2, 2024");
        assert_eq!(article.source_url, "https://blog.test/blogs/hello-world/");
        assert!(article.content.contains(&sentence(3)));
        assert!(!article.content.contains("Share"));
    }

    #[test]
    fn article_errors_carry_the_url() {
        let err = extract_article(
            "<body><main><p>Short</p></main></body>",
            &entry("Short"),
            &SiteProfile::default(),
        )
        .unwrap_err();
        assert!(err.is_content_too_short());
        assert_eq!(err.url, "https://blog.test/blogs/hello-world/");
    }
}
