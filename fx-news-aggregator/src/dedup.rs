use crate::registry::SourceClass;
use crate::store::ArticleStore;
use crate::types::{CandidateEntry, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Natural key used to recognise an item that is already stored.
///
/// Feed entries are keyed by title and publish time because feed entry ids
/// are not stable across fetches. API items carry stable urls and are keyed
/// by url.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    TitlePublished { title: String, published_millis: i64 },
    Url(String),
}

impl DedupKey {
    pub fn title_published(title: &str, published: DateTime<Utc>) -> Self {
        DedupKey::TitlePublished {
            title: title.to_string(),
            published_millis: published.timestamp_millis(),
        }
    }

    pub fn url(url: &str) -> Self {
        DedupKey::Url(url.to_string())
    }

    pub fn for_feed_entry(candidate: &CandidateEntry) -> Self {
        Self::title_published(&candidate.title, candidate.published)
    }

    pub fn for_api_item(candidate: &CandidateEntry) -> Self {
        Self::url(&candidate.link)
    }
}

/// Which key policy a pipeline run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    TitlePublished,
    Url,
}

impl DedupPolicy {
    pub fn for_feed(_class: SourceClass) -> Self {
        // both feed classes share the title/published key
        DedupPolicy::TitlePublished
    }

    pub fn key_for(&self, candidate: &CandidateEntry) -> DedupKey {
        match self {
            DedupPolicy::TitlePublished => DedupKey::for_feed_entry(candidate),
            DedupPolicy::Url => DedupKey::for_api_item(candidate),
        }
    }
}

/// Existence checks for one sweep.
///
/// Remembers every key it let through, so an item that shows up twice in
/// the same sweep is rejected even before its batch is committed.
pub struct Deduplicator {
    store: ArticleStore,
    seen: HashSet<DedupKey>,
}

impl Deduplicator {
    pub fn new(store: ArticleStore) -> Self {
        Self {
            store,
            seen: HashSet::new(),
        }
    }

    /// True when the candidate is new and should continue down the pipeline.
    pub async fn admit(&mut self, key: DedupKey) -> Result<bool> {
        if self.seen.contains(&key) {
            debug!("Already seen this sweep: {:?}", key);
            return Ok(false);
        }

        if self.store.exists(&key).await? {
            debug!("Already stored: {:?}", key);
            return Ok(false);
        }

        self.seen.insert(key);
        Ok(true)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
