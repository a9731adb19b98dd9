// ABOUTME: Output format converters for article bodies.
// ABOUTME: Renders sanitized HTML as-is, as Markdown via htmd, or as plain text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").unwrap());
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NEWLINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
static HSPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static PARA_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</p\s*>").unwrap());

/// The format an article body is printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Markdown,
    Text,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Text => "text",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => OutputFormat::Markdown,
            "text" | "txt" => OutputFormat::Text,
            _ => OutputFormat::Html,
        }
    }
}

impl OutputFormat {
    /// Converts an HTML body into this format.
    pub fn render(self, html: &str) -> String {
        match self {
            OutputFormat::Html => html.to_string(),
            OutputFormat::Markdown => html_to_markdown(html),
            OutputFormat::Text => html_to_text(html),
        }
    }
}

/// Convert HTML to Markdown using htmd.
///
/// On conversion error the input is returned unchanged.
pub fn html_to_markdown(html: &str) -> String {
    let preprocessed = BR_RE.replace_all(html, "\n");
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript"])
        .build();

    let md = converter
        .convert(&preprocessed)
        .unwrap_or_else(|_| preprocessed.to_string());
    BLANK_LINES_RE.replace_all(&md, "\n\n").to_string()
}

/// Convert HTML to plain text, one line per paragraph.
pub fn html_to_text(html: &str) -> String {
    let preprocessed = BR_RE.replace_all(html, "\n");
    let preprocessed = PARA_END_RE.replace_all(&preprocessed, "</p>\n");

    let document = Html::parse_fragment(&preprocessed);
    let raw_text: String = document.root_element().text().collect();

    let normalized = HSPACE_RE.replace_all(&raw_text, " ");
    let lines: Vec<&str> = normalized.split('\n').map(str::trim).collect();
    let joined = lines.join("\n");
    NEWLINES_RE.replace_all(&joined, "\n").trim().to_string()
}
