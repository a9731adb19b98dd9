// ABOUTME: Main library entry point for the harvest blog extraction pipeline.
// ABOUTME: Re-exports the public API: Crawler, CrawlerBuilder, ExtractedArticle, HarvestError, SiteProfile and the store types.

//! Harvest - extracts clean article bodies from paginated blogs.
//!
//! A [`Crawler`] walks a site's listing pages, fetches every article it finds
//! and runs each page through the extraction pipeline: container selection,
//! a four-tier strategy chain and a sanitizer. Results are plain
//! [`ExtractedArticle`] values that can be upserted into an [`ArticleStore`]
//! and later rewritten by an [`enrich::Enricher`].
//!
//! # Example
//!
//! ```no_run
//! use harvest_core::{Crawler, HarvestError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), HarvestError> {
//!     let crawler = Crawler::builder()
//!         .base_url("https://beyondchats.com/blogs")
//!         .build()?;
//!     for article in crawler.crawl(5).await? {
//!         println!("{} ({})", article.title, article.source_url);
//!     }
//!     Ok(())
//! }
//! ```

pub mod article;
pub mod crawl;
pub mod dom;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod formats;
pub mod listing;
pub mod options;
pub mod profile;
pub mod resource;
pub mod sanitize;
pub mod store;

pub use crate::article::{slug_from_url, ExtractedArticle};
pub use crate::crawl::Crawler;
pub use crate::error::{ErrorCode, HarvestError};
pub use crate::extract::{extract, extract_article, ExtractionAttempt, Tier, TierOutcome};
pub use crate::formats::OutputFormat;
pub use crate::listing::ListingEntry;
pub use crate::options::{CrawlOptions, CrawlerBuilder, DEFAULT_USER_AGENT};
pub use crate::profile::{NoiseRule, SiteProfile};
pub use crate::resource::{Fetcher, HttpFetcher};
pub use crate::store::{ArticleRecord, ArticleStore, Enrichment, MemoryStore, Reference};
