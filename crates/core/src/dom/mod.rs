// ABOUTME: Markup parsing and query helpers over dom_query documents.
// ABOUTME: Provides permissive parsing, whitespace-collapsed and rendered text, and text escaping.

//! DOM utilities for HTML document manipulation.
//!
//! Raw markup is loaded into a mutable [`Document`] that every later stage
//! queries and prunes. Parsing is tag-soup tolerant (html5ever); the only
//! unrecoverable input is markup with no content at all.

pub mod compiled;
pub mod container;
pub mod noise;

pub use dom_query::{Document, NodeRef, Selection};

use crate::error::HarvestError;

/// Elements that start a new block when text is rendered.
pub(crate) const RENDER_BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
];

/// Elements whose text never renders.
const UNRENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "title"];

/// Loads markup into a queryable document.
///
/// Malformed HTML parses permissively; only empty or whitespace-only input is
/// rejected with a Parse error.
pub fn parse(markup: &str) -> Result<Document, HarvestError> {
    if markup.trim().is_empty() {
        return Err(HarvestError::parse(
            "",
            "Parse",
            Some(anyhow::anyhow!("empty markup")),
        ));
    }
    Ok(Document::from(markup))
}

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Concatenated text of a selection, whitespace-collapsed.
pub fn collapsed_text(sel: &Selection) -> String {
    normalize_whitespace(&sel.text())
}

/// Lowercased tag name of an element node.
pub fn tag_name(node: &NodeRef) -> Option<String> {
    if !node.is_element() {
        return None;
    }
    node.node_name().map(|n| n.to_ascii_lowercase())
}

/// Text of a selection as a browser would lay it out: block elements are
/// separated by blank lines, `<br>` becomes a newline, and source newlines
/// inside text nodes are preserved.
pub fn rendered_text(sel: &Selection) -> String {
    let mut out = String::new();
    for node in sel.nodes() {
        render_node(node, &mut out);
    }
    out
}

fn render_node(node: &NodeRef, out: &mut String) {
    if node.is_text() {
        out.push_str(&node.text());
        return;
    }
    if !node.is_element() {
        // Document and fragment roots carry children but no tag.
        for child in node.children() {
            render_node(&child, out);
        }
        return;
    }

    let name = tag_name(node).unwrap_or_default();
    if UNRENDERED_TAGS.contains(&name.as_str()) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }

    let block = RENDER_BLOCK_TAGS.contains(&name.as_str());
    if block {
        out.push_str("\n\n");
    }
    for child in node.children() {
        render_node(&child, out);
    }
    if block {
        out.push_str("\n\n");
    }
}

/// Escapes text for inclusion inside an HTML element.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Wraps text in a paragraph element, escaping it.
pub fn paragraph(text: &str) -> String {
    format!("<p>{}</p>", escape_text(text))
}
