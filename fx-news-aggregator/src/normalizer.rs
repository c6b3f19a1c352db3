use crate::registry::{SourceClass, SourceDescriptor};
use crate::types::{AggregatorError, ApiNewsItem, CandidateEntry, ParsedEntry, Result};
use crate::utils::text::{collapse_whitespace, strip_html};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Result of normalizing one raw entry.
#[derive(Debug)]
pub enum Normalized {
    Candidate(CandidateEntry),
    /// Standard-source entry older than the recency horizon.
    Stale { title: String, published: DateTime<Utc> },
}

/// Turns raw feed entries and API items into pipeline candidates.
pub struct EntryNormalizer {
    now: DateTime<Utc>,
    horizon: Duration,
}

impl EntryNormalizer {
    pub fn new(now: DateTime<Utc>, horizon: Duration) -> Self {
        Self { now, horizon }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.now - self.horizon
    }

    pub fn normalize_feed_entry(&self, source: &SourceDescriptor, entry: ParsedEntry) -> Result<Normalized> {
        let title = entry
            .title
            .as_deref()
            .map(strip_html)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AggregatorError::entry("<untitled>", "entry has no title"))?;

        let link = entry
            .link
            .filter(|l| !l.is_empty())
            .ok_or_else(|| AggregatorError::entry(&title, "entry has no link"))?;

        let (published, published_inferred) = match entry.published_at {
            Some(ts) => (ts, false),
            None => {
                debug!("No publish time for '{}', using fetch time", title);
                (self.now, true)
            }
        };

        if source.class == SourceClass::Standard && published < self.cutoff() {
            return Ok(Normalized::Stale { title, published });
        }

        Ok(Normalized::Candidate(CandidateEntry {
            category: source.category.clone(),
            title,
            link,
            published,
            published_inferred,
            source_text: entry.summary.as_deref().map(strip_html).filter(|s| !s.is_empty()),
            extracted_text: String::new(),
            summary: String::new(),
            tags: Vec::new(),
        }))
    }

    pub fn normalize_api_item(&self, category: &str, item: ApiNewsItem) -> Result<CandidateEntry> {
        let title = collapse_whitespace(&item.headline);
        if title.is_empty() {
            return Err(AggregatorError::entry("<untitled>", "item has no headline"));
        }
        if item.url.is_empty() {
            return Err(AggregatorError::entry(&title, "item has no url"));
        }

        let parsed = if item.datetime > 0 {
            DateTime::<Utc>::from_timestamp(item.datetime, 0)
        } else {
            None
        };
        let (published, published_inferred) = match parsed {
            Some(ts) => (ts, false),
            None => (self.now, true),
        };

        let summary = item.summary.trim().to_string();
        Ok(CandidateEntry {
            category: category.to_string(),
            title,
            link: item.url,
            published,
            published_inferred,
            source_text: if summary.is_empty() { None } else { Some(summary) },
            extracted_text: String::new(),
            summary: String::new(),
            tags: Vec::new(),
        })
    }
}
