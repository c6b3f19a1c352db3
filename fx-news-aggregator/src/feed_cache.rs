use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Validators remembered for one source after its last successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCacheEntry {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_fetched_at: DateTime<Utc>,
}

impl FeedCacheEntry {
    pub fn has_validators(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }
}

/// Process-scoped validator cache keyed by source key.
///
/// Contents are lost on restart; the first sweep after a restart fetches
/// every source unconditionally.
#[derive(Debug, Clone, Default)]
pub struct FeedCacheStore {
    entries: Arc<RwLock<HashMap<String, FeedCacheEntry>>>,
}

impl FeedCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, source_key: &str) -> Option<FeedCacheEntry> {
        self.entries.read().await.get(source_key).cloned()
    }

    /// Replace the entry for `source_key` as a whole.
    pub async fn record(&self, source_key: &str, entry: FeedCacheEntry) {
        debug!(
            "Caching validators for {} (etag: {:?}, last-modified: {:?})",
            source_key, entry.etag, entry.last_modified
        );
        self.entries.write().await.insert(source_key.to_string(), entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
