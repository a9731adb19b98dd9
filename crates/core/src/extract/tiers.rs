// ABOUTME: The four content extraction tiers, from semantic selectors down to the raw container.
// ABOUTME: Each tier inspects the document or container and either accepts a candidate body or rejects.

use dom_query::{Document, NodeRef, Selection};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::dom::compiled::get_or_compile;
use crate::dom::{normalize_whitespace, paragraph, rendered_text, tag_name, RENDER_BLOCK_TAGS};

/// Minimum `p` count for a semantic match.
pub const SEMANTIC_MIN_PARAGRAPHS: usize = 2;
/// Minimum inner-HTML length for a semantic match.
pub const SEMANTIC_MIN_CHARS: usize = 200;
/// Paragraph-level text must be longer than this to be harvested.
pub const PARAGRAPH_MIN_CHARS: usize = 30;
/// Raw-text pieces must be longer than this to be kept.
pub const RAW_TEXT_MIN_CHARS: usize = 50;

/// Paragraph-level elements harvested by [`paragraphs`].
const HARVEST_TAGS: &[&str] = &["p", "span", "div", "li"];

/// Nested elements that make a harvest candidate a wrapper instead of a leaf.
const NESTED_BLOCK_TAGS: &[&str] = &["p", "div", "li"];

static BLANK_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[^\S\n]*\n").unwrap());

/// Outcome of one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    Accepted(String),
    Rejected,
}

/// Tier 1: the first profile selector whose first match holds enough
/// paragraphs and markup. Selectors are tried in priority order and a match
/// that falls short is treated as no match.
pub fn semantic(doc: &Document, selectors: &[String]) -> TierOutcome {
    for css in selectors {
        let Some(matcher) = get_or_compile(css) else {
            debug!(selector = %css, "semantic selector does not compile");
            continue;
        };
        let found = doc.select_matcher(&matcher).first();
        if !found.exists() {
            continue;
        }

        let html = found.inner_html().to_string();
        let paragraphs = found.select("p").length();
        let chars = html.chars().count();
        if paragraphs >= SEMANTIC_MIN_PARAGRAPHS && chars >= SEMANTIC_MIN_CHARS {
            debug!(selector = %css, paragraphs, chars, "semantic selector accepted");
            return TierOutcome::Accepted(html);
        }
        debug!(selector = %css, paragraphs, chars, "semantic match too thin");
    }
    TierOutcome::Rejected
}

/// Tier 2: leaf paragraph-level elements of the stripped container whose
/// collapsed text is long enough, each re-wrapped as an escaped `<p>`.
///
/// A paragraph-level element holding nested blocks is a wrapper: each run of
/// its own text and inline children becomes a candidate, and its block
/// children are harvested in turn.
pub fn paragraphs(container: &Selection) -> TierOutcome {
    let mut harvested = Vec::new();
    for node in container.nodes() {
        harvest_children(node, &mut harvested);
    }
    debug!(count = harvested.len(), "paragraph accumulation");
    if harvested.is_empty() {
        TierOutcome::Rejected
    } else {
        TierOutcome::Accepted(harvested.join("\n"))
    }
}

fn harvest_children(node: &NodeRef, out: &mut Vec<String>) {
    for child in node.children() {
        harvest_element(&child, out);
    }
}

fn harvest_element(node: &NodeRef, out: &mut Vec<String>) {
    let Some(name) = tag_name(node) else {
        return;
    };
    if !HARVEST_TAGS.contains(&name.as_str()) {
        harvest_children(node, out);
    } else if has_nested_block(node) {
        harvest_wrapper(node, out);
    } else {
        push_candidate(&node.text(), out);
    }
}

fn harvest_wrapper(node: &NodeRef, out: &mut Vec<String>) {
    let mut run = String::new();
    for child in node.children() {
        if child.is_text() {
            run.push_str(&child.text());
        } else if tag_name(&child).as_deref() == Some("br") {
            run.push(' ');
        } else if is_inline(&child) {
            run.push_str(&child.text());
        } else if child.is_element() {
            push_candidate(&run, out);
            run.clear();
            harvest_element(&child, out);
        }
    }
    push_candidate(&run, out);
}

fn push_candidate(raw: &str, out: &mut Vec<String>) {
    let text = normalize_whitespace(raw);
    if text.chars().count() > PARAGRAPH_MIN_CHARS {
        out.push(paragraph(&text));
    }
}

fn is_inline(node: &NodeRef) -> bool {
    tag_name(node).is_some_and(|name| !RENDER_BLOCK_TAGS.contains(&name.as_str()))
        && !has_nested_block(node)
}

fn has_nested_block(node: &NodeRef) -> bool {
    node.descendants().iter().any(|d| {
        tag_name(d).is_some_and(|name| NESTED_BLOCK_TAGS.contains(&name.as_str()))
    })
}

/// Tier 3: the container's rendered text split on blank lines, keeping the
/// long pieces.
pub fn raw_text(container: &Selection) -> TierOutcome {
    let text = rendered_text(container);
    let pieces: Vec<String> = BLANK_LINE_RE
        .split(&text)
        .map(normalize_whitespace)
        .filter(|piece| piece.chars().count() > RAW_TEXT_MIN_CHARS)
        .map(|piece| paragraph(&piece))
        .collect();
    debug!(count = pieces.len(), "raw text reconstruction");
    if pieces.is_empty() {
        TierOutcome::Rejected
    } else {
        TierOutcome::Accepted(pieces.join("\n"))
    }
}

/// Tier 4: whatever markup is left in the container.
pub fn last_resort(container: &Selection) -> TierOutcome {
    let html = container.inner_html().to_string();
    if html.trim().is_empty() {
        TierOutcome::Rejected
    } else {
        TierOutcome::Accepted(html)
    }
}
