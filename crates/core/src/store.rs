// ABOUTME: Article persistence: the ArticleStore trait and an in-memory store backed by a JSON file.
// ABOUTME: Upserts are keyed by source URL and keep the id, creation time and enrichment state.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::article::ExtractedArticle;
use crate::error::HarvestError;

/// A source consulted while rewriting an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

/// A stored article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: Uuid,
    pub title: String,
    pub source_url: String,
    pub slug: String,
    pub content: String,
    pub published_date: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_updated: bool,
    #[serde(default)]
    pub updated_content: Option<String>,
    #[serde(default)]
    pub enhanced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl ArticleRecord {
    fn new(article: ExtractedArticle) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: article.title,
            source_url: article.source_url,
            slug: article.slug,
            content: article.content,
            published_date: article.published_date,
            created_at: Utc::now(),
            is_updated: false,
            updated_content: None,
            enhanced_at: None,
            references: Vec::new(),
        }
    }

    fn replace_extracted(&mut self, article: ExtractedArticle) {
        self.title = article.title;
        self.slug = article.slug;
        self.content = article.content;
        self.published_date = article.published_date;
    }

    /// The rewritten body when there is one, else the extracted body.
    pub fn display_content(&self) -> &str {
        self.updated_content.as_deref().unwrap_or(&self.content)
    }
}

/// Result of a rewrite pass, applied with [`ArticleStore::update_enrichment`].
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub updated_content: String,
    pub references: Vec<Reference>,
    pub enhanced_at: DateTime<Utc>,
}

/// Persistence collaborator for extracted articles.
pub trait ArticleStore {
    /// Inserts a new record, or replaces the extracted fields of the record
    /// with the same source URL.
    fn upsert(&mut self, article: ExtractedArticle) -> Result<ArticleRecord, HarvestError>;

    /// Every record, newest first.
    fn find_all(&self) -> Vec<ArticleRecord>;

    fn find_by_id(&self, id: Uuid) -> Result<ArticleRecord, HarvestError>;

    /// Marks a record as rewritten.
    fn update_enrichment(
        &mut self,
        id: Uuid,
        enrichment: Enrichment,
    ) -> Result<ArticleRecord, HarvestError>;
}

/// Records kept in insertion order, optionally mirrored to a JSON file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<ArticleRecord>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store persisted at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HarvestError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let json = fs::read_to_string(&path).map_err(|e| {
                HarvestError::store(
                    "OpenStore",
                    Some(anyhow::anyhow!("{}: {}", path.display(), e)),
                )
            })?;
            serde_json::from_str(&json).map_err(|e| {
                HarvestError::store(
                    "OpenStore",
                    Some(anyhow::anyhow!("{}: {}", path.display(), e)),
                )
            })?
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), records = records.len(), "opened store");
        Ok(Self {
            records,
            path: Some(path),
        })
    }

    /// Writes the records back to the file the store was opened from.
    /// In-memory stores have nothing to save.
    pub fn save(&self) -> Result<(), HarvestError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|e| HarvestError::store("SaveStore", Some(anyhow::Error::new(e))))?;
        fs::write(path, json).map_err(|e| {
            HarvestError::store(
                "SaveStore",
                Some(anyhow::anyhow!("{}: {}", path.display(), e)),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ArticleStore for MemoryStore {
    fn upsert(&mut self, article: ExtractedArticle) -> Result<ArticleRecord, HarvestError> {
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|r| r.source_url == article.source_url)
        {
            existing.replace_extracted(article);
            return Ok(existing.clone());
        }
        let record = ArticleRecord::new(article);
        self.records.push(record.clone());
        Ok(record)
    }

    fn find_all(&self) -> Vec<ArticleRecord> {
        // Reversing first keeps later insertions ahead on equal timestamps.
        let mut all: Vec<ArticleRecord> = self.records.iter().rev().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    fn find_by_id(&self, id: Uuid) -> Result<ArticleRecord, HarvestError> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| HarvestError::not_found("FindById", id))
    }

    fn update_enrichment(
        &mut self,
        id: Uuid,
        enrichment: Enrichment,
    ) -> Result<ArticleRecord, HarvestError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| HarvestError::not_found("UpdateEnrichment", id))?;
        record.updated_content = Some(enrichment.updated_content);
        record.references = enrichment.references;
        record.enhanced_at = Some(enrichment.enhanced_at);
        record.is_updated = true;
        Ok(record.clone())
    }
}
