use crate::feed_cache::{FeedCacheEntry, FeedCacheStore};
use crate::parser::FeedParser;
use crate::registry::{SourceClass, SourceDescriptor};
use crate::traits::FeedClient;
use crate::types::{AggregatorError, FetchOutcome, ParsedFeed, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub enum SourceFetch {
    /// Validators matched; nothing to parse.
    Unchanged,
    Parsed(ParsedFeed),
}

impl SourceFetch {
    pub fn entry_count(&self) -> usize {
        match self {
            SourceFetch::Unchanged => 0,
            SourceFetch::Parsed(feed) => feed.entries.len(),
        }
    }
}

/// Decides whether a source needs refetching and keeps its validators.
pub struct ConditionalFetcher {
    client: Arc<dyn FeedClient>,
    cache: FeedCacheStore,
}

impl ConditionalFetcher {
    pub fn new(client: Arc<dyn FeedClient>, cache: FeedCacheStore) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &FeedCacheStore {
        &self.cache
    }

    /// Fetch and parse one source.
    ///
    /// Only time-filterable sources send validators. The cache entry is
    /// replaced after the body has been fetched *and* parsed; an unchanged
    /// answer or any error leaves it as it was.
    pub async fn fetch(&self, source: &SourceDescriptor) -> Result<SourceFetch> {
        let cached = match source.class {
            SourceClass::TimeFilterable => self.cache.get(&source.key).await,
            SourceClass::Standard => None,
        };

        let etag = cached.as_ref().and_then(|c| c.etag.as_deref());
        let last_modified = cached.as_ref().and_then(|c| c.last_modified.as_deref());

        let outcome = self
            .client
            .fetch_feed(&source.url, etag, last_modified)
            .await
            .map_err(|e| AggregatorError::source(&source.key, e.to_string()))?;

        match outcome {
            FetchOutcome::NotModified => {
                info!("Source {} unchanged since last fetch", source.key);
                Ok(SourceFetch::Unchanged)
            }
            FetchOutcome::Fetched { body, etag, last_modified } => {
                let parsed = FeedParser::parse_feed(&body)
                    .map_err(|e| AggregatorError::source(&source.key, e.to_string()))?;

                debug!("Source {} returned {} entries", source.key, parsed.entries.len());

                self.cache
                    .record(
                        &source.key,
                        FeedCacheEntry {
                            etag,
                            last_modified,
                            last_fetched_at: Utc::now(),
                        },
                    )
                    .await;

                Ok(SourceFetch::Parsed(parsed))
            }
        }
    }
}
