// ABOUTME: Enrichment orchestration: reference search, reference scraping and the rewrite pass over stored articles.
// ABOUTME: Search and rewrite services are traits; failures degrade to a fallback note instead of aborting the run.

use async_trait::async_trait;
use chrono::Utc;
use dom_query::Document;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dom::collapsed_text;
use crate::error::HarvestError;
use crate::resource::Fetcher;
use crate::store::{ArticleRecord, ArticleStore, Enrichment, Reference};

/// Articles with less content than this are not rewritten.
pub const MIN_PENDING_CONTENT_CHARS: usize = 50;
/// Search hits consulted per article.
pub const MAX_REFERENCES: usize = 2;
/// Scraped reference text is cut to this many characters.
pub const REFERENCE_TEXT_CAP: usize = 2500;
/// Scraped reference text must be longer than this to be used.
pub const MIN_REFERENCE_CHARS: usize = 200;
/// Original content included in the prompt.
pub const PROMPT_ORIGINAL_CAP: usize = 2000;
/// Reference excerpt included in the prompt.
pub const PROMPT_SNIPPET_CAP: usize = 500;
/// Replies must be longer than this to replace the fallback note.
pub const MIN_REPLY_CHARS: usize = 100;

const REFERENCE_NOISE: &str = "script, style, nav, footer, header, aside, .ad-container, .popup";
const REFERENCE_CONTAINERS: &[&str] = &["article", "main", ".content", "#content", "body"];

/// A search result pointing at a related article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

/// Finds articles related to a title.
#[async_trait]
pub trait ReferenceSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, HarvestError>;
}

/// Rewrites an article given a complete prompt.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, prompt: &str) -> Result<String, HarvestError>;
}

/// A search hit together with the text scraped from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceText {
    pub hit: SearchHit,
    pub text: String,
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Main text of a reference page, whitespace-collapsed and capped.
pub fn reference_text(markup: &str) -> String {
    let doc = Document::from(markup);
    doc.select(REFERENCE_NOISE).remove();
    let text = REFERENCE_CONTAINERS
        .iter()
        .map(|css| doc.select(css).first())
        .find(|sel| sel.exists())
        .map(|sel| collapsed_text(&sel))
        .unwrap_or_default();
    truncate_chars(&text, REFERENCE_TEXT_CAP).to_string()
}

/// The rewrite instruction sent to the [`Rewriter`].
pub fn build_prompt(original: &str, references: &[ReferenceText]) -> String {
    let context = if references.is_empty() {
        String::new()
    } else {
        let snippets: Vec<String> = references
            .iter()
            .map(|r| {
                format!(
                    "Source: {}\nContent Snippet: {}...",
                    r.hit.title,
                    truncate_chars(&r.text, PROMPT_SNIPPET_CAP)
                )
            })
            .collect();
        format!("\n\n### Reference Context:\n{}", snippets.join("\n\n"))
    };

    format!(
        "Task: Rewrite this article for a professional business audience.\n\
         Rules:\n\
         1. Change the structure (e.g., use different headings).\n\
         2. Rephrase sentences completely (avoid plagiarism).\n\
         3. Use a professional, authoritative tone.\n\
         4. Do NOT start with \"Here is a rewrite\". Start directly with the Title.\n\n\
         Original Article:\n{}\n\n{}\n\nRewrite ( Markdown ):",
        truncate_chars(original, PROMPT_ORIGINAL_CAP),
        context
    )
}

/// Removes a surrounding markdown code fence from a reply.
pub fn strip_code_fences(reply: &str) -> String {
    let mut text = reply.trim_start();
    if text
        .get(..11)
        .is_some_and(|lead| lead.eq_ignore_ascii_case("```markdown"))
    {
        text = &text[11..];
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    let text = text.trim_end();
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim().to_string()
}

/// Body stored when the rewrite fails: the original with a visible note.
pub fn fallback_note(original: &str) -> String {
    let lead: Vec<&str> = original.split(' ').take(10).collect();
    format!(
        "# [Original] {}...\n\n> **System Note**: AI enhancement failed. Displaying original content.\n\n{}",
        lead.join(" "),
        original
    )
}

/// True when a record still needs a rewrite.
pub fn is_pending(record: &ArticleRecord) -> bool {
    !record.is_updated && record.content.chars().count() >= MIN_PENDING_CONTENT_CHARS
}

/// Drives search, scraping and rewriting for every pending record.
pub struct Enricher<S, R, F> {
    search: S,
    rewriter: R,
    fetcher: F,
}

impl<S, R, F> Enricher<S, R, F>
where
    S: ReferenceSearch,
    R: Rewriter,
    F: Fetcher,
{
    pub fn new(search: S, rewriter: R, fetcher: F) -> Self {
        Self {
            search,
            rewriter,
            fetcher,
        }
    }

    /// Rewrites every pending record in `store` and returns the updated records.
    ///
    /// Search, scrape and rewrite failures only degrade the result; store
    /// errors abort the run.
    pub async fn enrich_pending<St>(&self, store: &mut St) -> Result<Vec<ArticleRecord>, HarvestError>
    where
        St: ArticleStore + ?Sized,
    {
        let pending: Vec<ArticleRecord> = store.find_all().into_iter().filter(is_pending).collect();
        info!(pending = pending.len(), "enriching articles");

        let mut updated = Vec::with_capacity(pending.len());
        for record in pending {
            let enrichment = self.enrich_one(&record).await;
            updated.push(store.update_enrichment(record.id, enrichment)?);
        }
        Ok(updated)
    }

    async fn enrich_one(&self, record: &ArticleRecord) -> Enrichment {
        let hits: Vec<SearchHit> = match self.search.search(&record.title).await {
            Ok(hits) => hits.into_iter().take(MAX_REFERENCES).collect(),
            Err(e) => {
                warn!(title = %record.title, error = %e, "reference search failed");
                Vec::new()
            }
        };

        let mut references = Vec::new();
        for hit in &hits {
            match self.fetcher.fetch(&hit.url).await {
                Ok(markup) => {
                    let text = reference_text(&markup);
                    if text.chars().count() > MIN_REFERENCE_CHARS {
                        references.push(ReferenceText {
                            hit: hit.clone(),
                            text,
                        });
                    } else {
                        debug!(url = %hit.url, "reference too thin");
                    }
                }
                Err(e) => warn!(url = %hit.url, error = %e, "reference fetch failed"),
            }
        }
        debug!(id = %record.id, references = references.len(), "gathered references");

        let prompt = build_prompt(&record.content, &references);
        let updated_content = match self.rewriter.rewrite(&prompt).await {
            Ok(reply) => {
                let text = strip_code_fences(&reply);
                if text.chars().count() > MIN_REPLY_CHARS {
                    text
                } else {
                    warn!(id = %record.id, "rewrite reply too short");
                    fallback_note(&record.content)
                }
            }
            Err(e) => {
                warn!(id = %record.id, error = %e, "rewrite failed");
                fallback_note(&record.content)
            }
        };

        Enrichment {
            updated_content,
            references: hits
                .into_iter()
                .map(|hit| Reference {
                    title: hit.title,
                    url: hit.url,
                })
                .collect(),
            enhanced_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ExtractedArticle;
    use crate::store::MemoryStore;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StaticSearch(Vec<SearchHit>);

    #[async_trait]
    impl ReferenceSearch for StaticSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, HarvestError> {
            Ok(self.0.clone())
        }
    }

    struct RecordingRewriter {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Rewriter for RecordingRewriter {
        async fn rewrite(&self, prompt: &str) -> Result<String, HarvestError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|_| HarvestError::rewrite("", "Rewrite", None))
        }
    }

    struct MapFetcher(HashMap<String, String>);

    #[async_trait]
    impl Fetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<String, HarvestError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| HarvestError::fetch(url, "Fetch", None))
        }
    }

    fn hit(n: usize) -> SearchHit {
        SearchHit {
            title: format!("Reference {}", n),
            url: format!("https://ref.test/{}", n),
        }
    }

    fn stored(content: &str) -> ArticleRecord {
        let mut store = MemoryStore::new();
        store
            .upsert(ExtractedArticle {
                title: "T".to_string(),
                source_url: "https://blog.test/t/".to_string(),
                slug: "t".to_string(),
                content: content.to_string(),
                published_date: "2024".to_string(),
            })
            .unwrap()
    }

    #[test]
    fn reference_text_prefers_article_and_drops_noise() {
        let text = reference_text(
            "<body><nav>Menu</nav><article><p>Main   text</p><aside>Ad</aside></article><footer>F</footer></body>",
        );
        assert_eq!(text, "Main text");
    }

    #[test]
    fn reference_text_is_capped() {
        let html = format!("<main>{}</main>", "word ".repeat(2000));
        assert_eq!(reference_text(&html).chars().count(), REFERENCE_TEXT_CAP);
    }

    #[test]
    fn prompt_caps_original_and_snippets() {
        let original = "o".repeat(3000);
        let refs = vec![ReferenceText {
            hit: hit(1),
            text: "r".repeat(900),
        }];
        let prompt = build_prompt(&original, &refs);

        assert!(prompt.contains(&"o".repeat(PROMPT_ORIGINAL_CAP)));
        assert!(!prompt.contains(&"o".repeat(PROMPT_ORIGINAL_CAP + 1)));
        assert!(prompt.contains(&format!("Content Snippet: {}...", "r".repeat(PROMPT_SNIPPET_CAP))));
        assert!(prompt.contains("Source: Reference 1"));
        assert!(prompt.ends_with("Rewrite ( Markdown ):"));
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fences("```markdown\n# Title\nBody\n```"), "# Title\nBody");
        assert_eq!(strip_code_fences("```\nplain\n```  "), "plain");
        assert_eq!(strip_code_fences("# No fences"), "# No fences");
    }

    #[test]
    fn fallback_note_quotes_leading_words() {
        let note = fallback_note("one two three four five six seven eight nine ten eleven");
        assert!(note.starts_with("# [Original] one two three four five six seven eight nine ten..."));
        assert!(note.ends_with("ten eleven"));
    }

    #[test]
    fn short_content_is_not_pending() {
        assert!(!is_pending(&stored("<p>short</p>")));
        assert!(is_pending(&stored(&"x".repeat(60))));
    }

    #[tokio::test]
    async fn enrich_pending_updates_records() {
        let long_ref = format!("<article>{}</article>", "Useful reference sentence. ".repeat(20));
        let fetcher = MapFetcher(HashMap::from([
            ("https://ref.test/1".to_string(), long_ref),
            ("https://ref.test/2".to_string(), "<article>thin</article>".to_string()),
        ]));
        let rewriter = RecordingRewriter {
            reply: Ok(format!("```markdown\n# Rewritten\n{}\n```", "Better prose. ".repeat(20))),
            prompts: Mutex::new(Vec::new()),
        };
        let enricher = Enricher::new(StaticSearch(vec![hit(1), hit(2), hit(3)]), rewriter, fetcher);

        let mut store = MemoryStore::new();
        let record = store
            .upsert(ExtractedArticle {
                title: "Chatbots".to_string(),
                source_url: "https://blog.test/chatbots/".to_string(),
                slug: "chatbots".to_string(),
                content: format!("<p>{}</p>", "Original body text. ".repeat(10)),
                published_date: "2024".to_string(),
            })
            .unwrap();

        let updated = enricher.enrich_pending(&mut store).await.unwrap();
        assert_eq!(updated.len(), 1);

        let after = store.find_by_id(record.id).unwrap();
        assert!(after.is_updated);
        assert!(after.enhanced_at.is_some());
        assert!(after.updated_content.as_deref().unwrap().starts_with("# Rewritten"));
        assert_eq!(after.references.len(), 2);

        let prompts = enricher.rewriter.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Source: Reference 1"));
        assert!(!prompts[0].contains("Source: Reference 2"));

        drop(prompts);
        assert!(enricher.enrich_pending(&mut store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_rewrite_stores_fallback_note() {
        let enricher = Enricher::new(
            StaticSearch(Vec::new()),
            RecordingRewriter {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            },
            MapFetcher(HashMap::new()),
        );
        let mut store = MemoryStore::new();
        store
            .upsert(ExtractedArticle {
                title: "T".to_string(),
                source_url: "https://blog.test/t/".to_string(),
                slug: "t".to_string(),
                content: "x".repeat(80),
                published_date: "2024".to_string(),
            })
            .unwrap();

        let updated = enricher.enrich_pending(&mut store).await.unwrap();
        assert!(updated[0]
            .updated_content
            .as_deref()
            .unwrap()
            .starts_with("# [Original]"));
        assert!(updated[0].is_updated);
    }
}
