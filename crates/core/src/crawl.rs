// ABOUTME: The listing crawler that walks paginated listings and extracts every discovered article.
// ABOUTME: Pages are walked last to first; each page's candidates are fetched concurrently and reassembled in order.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::article::ExtractedArticle;
use crate::error::HarvestError;
use crate::extract::extract_article;
use crate::listing::{listing_entries, max_page, ListingEntry};
use crate::options::{CrawlOptions, CrawlerBuilder};
use crate::resource::{Fetcher, HttpFetcher};
use crate::store::{ArticleRecord, ArticleStore};

/// Crawls one site's paginated listing.
///
/// The crawler holds no state between runs; every call to [`Crawler::crawl`]
/// starts from the first listing page with an empty attempted set.
#[derive(Debug)]
pub struct Crawler<F = HttpFetcher> {
    opts: CrawlOptions,
    fetcher: F,
}

impl Crawler<HttpFetcher> {
    /// Create a new CrawlerBuilder for configuring the crawler.
    pub fn builder() -> CrawlerBuilder {
        CrawlerBuilder::new()
    }
}

impl<F: Fetcher> Crawler<F> {
    /// Pairs options with any fetcher implementation.
    pub fn with_fetcher(opts: CrawlOptions, fetcher: F) -> Self {
        Self { opts, fetcher }
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.opts
    }

    /// Collects up to `target` articles, oldest listing page first.
    ///
    /// A failure to load the first listing page is an error, as is any
    /// failure that is not tied to a single URL. Failed listing pages and
    /// articles are logged and skipped, so fewer than `target` articles
    /// (including none) is a normal result.
    pub async fn crawl(&self, target: usize) -> Result<Vec<ExtractedArticle>, HarvestError> {
        let profile = &self.opts.profile;
        let base_url = profile.base_url.as_str();
        if target == 0 {
            return Ok(Vec::new());
        }

        let first = self
            .fetch_with_deadline(base_url)
            .await
            .map_err(|e| HarvestError::crawl_failed(base_url, "Crawl", Some(anyhow::Error::new(e))))?;
        if first.trim().is_empty() {
            return Err(HarvestError::crawl_failed(
                base_url,
                "Crawl",
                Some(anyhow::anyhow!("first listing page is empty")),
            ));
        }

        let last_page = max_page(&first, &profile.pagination_selector)?;
        info!(site = %profile.name, base_url, last_page, target, "starting crawl");

        let mut attempted: HashSet<String> = HashSet::new();
        let mut collected: Vec<ExtractedArticle> = Vec::with_capacity(target);

        for page in (1..=last_page).rev() {
            if collected.len() >= target {
                break;
            }

            let page_url = profile.page_url(page);
            let markup = if page == 1 {
                first.clone()
            } else {
                match self.fetch_with_deadline(&page_url).await {
                    Ok(markup) => markup,
                    Err(e) => {
                        warn!(page, url = %page_url, error = %e, "skipping listing page");
                        continue;
                    }
                }
            };

            let entries = listing_entries(&markup, &page_url, &profile.listing_link_selector)?;
            let candidates: Vec<ListingEntry> = entries
                .into_iter()
                .filter(|entry| attempted.insert(entry.url.clone()))
                .collect();
            debug!(page, candidates = candidates.len(), "listing page parsed");

            let results: Vec<Result<ExtractedArticle, HarvestError>> =
                stream::iter(candidates.iter().map(|entry| self.harvest_entry(entry)))
                    .buffered(self.opts.concurrency.max(1))
                    .collect()
                    .await;

            // Later successes on the page backfill earlier failures.
            for result in results {
                match result {
                    Ok(article) if collected.len() < target => collected.push(article),
                    Ok(article) => debug!(url = %article.source_url, "target reached, discarding"),
                    Err(e) if e.is_per_url() => {
                        warn!(url = %e.url, code = %e.code, error = %e, "dropping article")
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        info!(collected = collected.len(), target, "crawl finished");
        Ok(collected)
    }

    /// Crawls, then upserts every article into `store`.
    pub async fn crawl_into<S>(
        &self,
        target: usize,
        store: &mut S,
    ) -> Result<Vec<ArticleRecord>, HarvestError>
    where
        S: ArticleStore + ?Sized,
    {
        let articles = self.crawl(target).await?;
        articles
            .into_iter()
            .map(|article| store.upsert(article))
            .collect()
    }

    async fn harvest_entry(&self, entry: &ListingEntry) -> Result<ExtractedArticle, HarvestError> {
        let markup = self.fetch_with_deadline(&entry.url).await?;
        extract_article(&markup, entry, &self.opts.profile)
    }

    async fn fetch_with_deadline(&self, url: &str) -> Result<String, HarvestError> {
        tokio::time::timeout(self.opts.timeout, self.fetcher.fetch(url))
            .await
            .map_err(|_| {
                HarvestError::timeout(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("no response within {:?}", self.opts.timeout)),
                )
            })?
    }
}
