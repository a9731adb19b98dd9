// ABOUTME: Best-effort publish date lookup on an article page.
// ABOUTME: Reads profile date selectors, then time[datetime], else stamps the current UTC time.

use chrono::{SecondsFormat, Utc};
use dom_query::Document;

use crate::dom::collapsed_text;
use crate::dom::compiled::get_or_compile;

/// First non-empty date text on the page.
///
/// Must run before the page is stripped: date markup usually lives in the
/// header or post meta that the noise rules remove.
pub fn published_date(doc: &Document, selectors: &[String]) -> String {
    find_date(doc, selectors).unwrap_or_else(now_rfc3339)
}

fn find_date(doc: &Document, selectors: &[String]) -> Option<String> {
    for css in selectors {
        let Some(matcher) = get_or_compile(css) else {
            continue;
        };
        let found = doc.select_matcher(&matcher).first();
        if found.exists() {
            let text = collapsed_text(&found);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    doc.select("time[datetime]")
        .first()
        .attr("datetime")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn selectors() -> Vec<String> {
        crate::profile::SiteProfile::default().date_selectors
    }

    #[test]
    fn prefers_time_text() {
        let doc = Document::from(
            r#"<header><time datetime="2024-03-01">March 1, 2024</time></header><p class="date">x</p>"#,
        );
        assert_eq!(published_date(&doc, &selectors()), "March 1, 2024");
    }

    #[test]
    fn falls_through_empty_matches() {
        let doc = Document::from(
            r#"<span class="date">  </span><div class="posted-on">Posted on 2 May 2023</div>"#,
        );
        assert_eq!(published_date(&doc, &selectors()), "Posted on 2 May 2023");
    }

    #[test]
    fn uses_datetime_attribute_when_text_is_empty() {
        let doc = Document::from(r#"<time datetime="2023-11-05T10:00:00Z"></time>"#);
        assert_eq!(published_date(&doc, &selectors()), "2023-11-05T10:00:00Z");
    }

    #[test]
    fn defaults_to_now() {
        let doc = Document::from("<p>No date here</p>");
        let date = published_date(&doc, &selectors());
        assert!(DateTime::parse_from_rfc3339(&date).is_ok(), "{}", date);
    }
}
