use crate::extraction::ContentKind;
use crate::types::{FetchOutcome, Result};
use async_trait::async_trait;

/// Transport for feed documents, with conditional-request support.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch `url`, sending whichever validators are present.
    ///
    /// Returns `FetchOutcome::NotModified` when the server confirms the
    /// validators still match.
    async fn fetch_feed(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchOutcome>;
}

/// Turns a linked document into plain text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str, kind: ContentKind) -> Result<String>;
}
