// ABOUTME: Container selection: picks the root node most likely to hold the article body.
// ABOUTME: Strict priority of main, then article, then body; first match wins.

use dom_query::{Document, Selection};

/// Container tags in priority order. `body` is the guaranteed fallback.
const CONTAINER_PRIORITY: &[&str] = &["main", "article"];

/// Returns the first `main`, else the first `article`, else the body.
///
/// html5ever always synthesizes a body, so a container is always found; the
/// document root is only returned if that ever stops holding.
pub fn select_container(doc: &Document) -> Selection<'_> {
    for tag in CONTAINER_PRIORITY {
        let found = doc.select(tag).first();
        if found.exists() {
            return found;
        }
    }

    let body = doc.select("body").first();
    if body.exists() {
        return body;
    }
    Selection::from(doc.root())
}
