// ABOUTME: Per-site extraction profile: listing selectors, content selectors and denylist rule tables.
// ABOUTME: Profiles deserialize from JSON so a target site can be tuned without touching extraction logic.

//! Site profiles.
//!
//! A [`SiteProfile`] gathers every site-dependent knob of the pipeline: where
//! the listing lives, how pagination and article links are found, which
//! selectors mark semantic content, and the two denylist tables applied by the
//! noise stripper and the sanitizer. The [`Default`] profile targets a
//! WordPress-style blog; JSON files may override any subset of fields.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

/// One entry of a denylist table.
///
/// Serialized externally tagged, e.g. `{"tag": "nav"}` or
/// `{"class_contains": "share"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseRule {
    /// Matches elements by tag name.
    Tag(String),
    /// Matches elements carrying the class token.
    Class(String),
    /// Matches the element with this id.
    Id(String),
    /// Matches elements whose class attribute contains the substring.
    ClassContains(String),
    /// Matches an arbitrary CSS selector.
    Selector(String),
}

impl NoiseRule {
    /// The CSS selector equivalent of this rule.
    pub fn to_css(&self) -> String {
        match self {
            NoiseRule::Tag(name) => name.clone(),
            NoiseRule::Class(name) => format!(".{}", name),
            NoiseRule::Id(name) => format!("#{}", name),
            NoiseRule::ClassContains(needle) => format!("[class*=\"{}\"]", needle),
            NoiseRule::Selector(css) => css.clone(),
        }
    }
}

fn tags<'a>(names: &'a [&'a str]) -> impl Iterator<Item = NoiseRule> + 'a {
    names.iter().map(|n| NoiseRule::Tag(n.to_string()))
}

fn classes<'a>(names: &'a [&'a str]) -> impl Iterator<Item = NoiseRule> + 'a {
    names.iter().map(|n| NoiseRule::Class(n.to_string()))
}

/// Structural boilerplate removed from the container before paragraph harvesting.
pub fn default_noise_rules() -> Vec<NoiseRule> {
    tags(&["header", "footer", "nav"])
        .chain(classes(&["sidebar", "comments", "related-posts"]))
        .chain(std::iter::once(NoiseRule::Id("comments".to_string())))
        .chain(classes(&[
            "menu",
            "skip-link",
            "widget-area",
            "site-header",
            "site-footer",
        ]))
        .chain(tags(&["script", "style", "iframe", "form"]))
        .collect()
}

/// Second-pass denylist applied to the extracted fragment.
pub fn default_sanitize_rules() -> Vec<NoiseRule> {
    tags(&[
        "script", "style", "iframe", "nav", "footer", "header", "form",
    ])
    .chain(classes(&[
        "sharedaddy",
        "related-posts",
        "addtoany_share_save_container",
        "meta",
        "post-meta",
    ]))
    .chain([
        NoiseRule::ClassContains("share".to_string()),
        NoiseRule::ClassContains("related".to_string()),
        NoiseRule::Selector("a[href=\"#content\"]".to_string()),
    ])
    .collect()
}

/// Site-specific configuration for listing discovery and content extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Human-readable profile name, used in logs.
    pub name: String,
    /// First listing page; also page 1 of the pagination.
    pub base_url: String,
    /// Listing page URL for n > 1. `{base}` and `{n}` are substituted.
    pub page_url_template: String,
    /// Anchors on a listing page that point at articles.
    pub listing_link_selector: String,
    /// Elements whose numeric labels reveal the last listing page.
    pub pagination_selector: String,
    /// Semantic content containers, highest priority first.
    pub content_selectors: Vec<String>,
    /// Rules applied by the noise stripper.
    pub noise_rules: Vec<NoiseRule>,
    /// Rules applied by the sanitizer.
    pub sanitize_rules: Vec<NoiseRule>,
    /// Elements whose text holds the publish date, highest priority first.
    pub date_selectors: Vec<String>,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            name: "beyondchats".to_string(),
            base_url: "https://beyondchats.com/blogs".to_string(),
            page_url_template: "{base}/page/{n}/".to_string(),
            listing_link_selector: "h2 a".to_string(),
            pagination_selector: "a".to_string(),
            content_selectors: vec![
                ".entry-content".to_string(),
                ".post-content".to_string(),
                "article .content".to_string(),
                "#main .post".to_string(),
            ],
            noise_rules: default_noise_rules(),
            sanitize_rules: default_sanitize_rules(),
            date_selectors: vec![
                "time".to_string(),
                ".date".to_string(),
                ".posted-on".to_string(),
            ],
        }
    }
}

impl SiteProfile {
    /// Parses a profile from JSON. Missing fields keep their default values.
    pub fn from_json(json: &str) -> Result<Self, HarvestError> {
        serde_json::from_str(json)
            .map_err(|e| HarvestError::config("ParseProfile", Some(anyhow::Error::new(e))))
    }

    /// Reads and parses a JSON profile file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, HarvestError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            HarvestError::config(
                "LoadProfile",
                Some(anyhow::anyhow!("{}: {}", path.display(), e)),
            )
        })?;
        Self::from_json(&json)
    }

    /// URL of listing page `n`. Page 1 is the base URL itself.
    pub fn page_url(&self, n: u32) -> String {
        if n <= 1 {
            return self.base_url.clone();
        }
        self.page_url_template
            .replace("{base}", self.base_url.trim_end_matches('/'))
            .replace("{n}", &n.to_string())
    }
}
