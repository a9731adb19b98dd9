// ABOUTME: Configuration options for the crawler including CrawlOptions and CrawlerBuilder.
// ABOUTME: CrawlerBuilder provides a fluent API for constructing Crawler instances with custom settings.

use std::collections::HashMap;
use std::time::Duration;

use crate::crawl::Crawler;
use crate::error::HarvestError;
use crate::profile::SiteProfile;
use crate::resource::HttpFetcher;

/// Desktop Chrome user agent. Many blogs reject obvious bot agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration options for a crawl.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Deadline for each page fetch.
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub allow_private_networks: bool,
    /// Article pages fetched at once within one listing page.
    pub concurrency: usize,
    pub profile: SiteProfile,
    pub http_client: Option<reqwest::Client>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: HashMap::new(),
            allow_private_networks: false,
            concurrency: 4,
            profile: SiteProfile::default(),
            http_client: None,
        }
    }
}

/// Builder for constructing Crawler instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct CrawlerBuilder {
    opts: CrawlOptions,
}

impl CrawlerBuilder {
    /// Create a new CrawlerBuilder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-fetch timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Allow or disallow requests to private networks.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        self.opts.allow_private_networks = allow;
        self
    }

    /// Set how many article pages are fetched concurrently. Zero is treated as one.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.opts.concurrency = concurrency.max(1);
        self
    }

    /// Use a different site profile.
    pub fn profile(mut self, profile: SiteProfile) -> Self {
        self.opts.profile = profile;
        self
    }

    /// Override the profile's first listing page.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.opts.profile.base_url = base_url.into();
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// The options collected so far.
    pub fn options(&self) -> &CrawlOptions {
        &self.opts
    }

    /// Build a Crawler over the real HTTP fetcher.
    pub fn build(self) -> Result<Crawler<HttpFetcher>, HarvestError> {
        url::Url::parse(&self.opts.profile.base_url).map_err(|e| {
            HarvestError::invalid_url(
                self.opts.profile.base_url.clone(),
                "BuildCrawler",
                Some(anyhow::Error::new(e)),
            )
        })?;
        let fetcher = HttpFetcher::new(&self.opts)?;
        Ok(Crawler::with_fetcher(self.opts, fetcher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = CrawlOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(15));
        assert_eq!(opts.concurrency, 4);
        assert!(opts.user_agent.contains("Chrome/"));
        assert!(!opts.allow_private_networks);
    }

    #[test]
    fn builder_sets_fields() {
        let builder = CrawlerBuilder::new()
            .timeout(Duration::from_secs(3))
            .concurrency(0)
            .base_url("https://other.test/news")
            .header("Accept-Language", "en")
            .allow_private_networks(true);
        let opts = builder.options();

        assert_eq!(opts.timeout, Duration::from_secs(3));
        assert_eq!(opts.concurrency, 1);
        assert_eq!(opts.profile.base_url, "https://other.test/news");
        assert_eq!(opts.profile.listing_link_selector, "h2 a");
        assert_eq!(opts.headers.get("Accept-Language").map(String::as_str), Some("en"));
        assert!(opts.allow_private_networks);
    }

    #[test]
    fn build_rejects_unparseable_base_url() {
        let err = CrawlerBuilder::new().base_url("not a url").build().unwrap_err();
        assert!(err.is_invalid_url());
    }
}
