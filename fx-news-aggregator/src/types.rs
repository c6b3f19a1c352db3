use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use interfaces::defs::{ApiNewsItem, Article, CurrencyTag, NewArticle, NewsApi, TimeWindow};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    /// Initial backoff delay, doubled on every retry.
    pub retry_delay_ms: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    /// Minimum spacing between two requests to the same host.
    pub min_host_interval_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "FX-News-Aggregator/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_ms: 5000,
            max_feed_size_mb: 10,
            max_redirects: 5,
            min_host_interval_ms: 1000,
        }
    }
}

/// Outcome of one HTTP feed request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The server answered 304 for the validators we sent.
    NotModified,
    Fetched {
        body: String,
        etag: Option<String>,
        last_modified: Option<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

/// A feed entry as the parser saw it, before any validation.
#[derive(Debug, Clone, Default)]
pub struct ParsedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Which part of a sweep produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SweepStage {
    TimeFiltered,
    Standard,
    ExternalApi,
}

impl SweepStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepStage::TimeFiltered => "time_filtered",
            SweepStage::Standard => "standard",
            SweepStage::ExternalApi => "external_api",
        }
    }
}

/// An entry travelling through the pipeline within one sweep.
#[derive(Debug, Clone)]
pub struct CandidateEntry {
    pub category: String,
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
    /// True when the source gave no usable time and `published` is the fetch time.
    pub published_inferred: bool,
    /// Text the source itself carried (feed summary or API summary).
    pub source_text: Option<String>,
    pub extracted_text: String,
    pub summary: String,
    pub tags: Vec<CurrencyTag>,
}

impl CandidateEntry {
    /// Text used when extraction yields nothing: the source's own text, else the title.
    pub fn fallback_text(&self) -> &str {
        match self.source_text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.title,
        }
    }

    pub fn into_new_article(self) -> NewArticle {
        NewArticle {
            category: self.category,
            title: self.title,
            summary: self.summary,
            url: self.link,
            published: self.published,
            currency_tags: self.tags,
        }
    }
}

/// Counters for one stage of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub processed: usize,
    pub added: usize,
    pub duplicates: usize,
    pub stale: usize,
    pub failed_entries: usize,
    pub sources: usize,
    pub failed_sources: usize,
    pub unchanged_sources: usize,
    pub committed_batches: usize,
    pub failed_batches: usize,
    /// Accepted items lost to a rolled-back batch.
    pub dropped: usize,
    pub skipped: bool,
}

impl StageReport {
    pub fn merge(&mut self, other: &StageReport) {
        self.processed += other.processed;
        self.added += other.added;
        self.duplicates += other.duplicates;
        self.stale += other.stale;
        self.failed_entries += other.failed_entries;
        self.sources += other.sources;
        self.failed_sources += other.failed_sources;
        self.unchanged_sources += other.unchanged_sources;
        self.committed_batches += other.committed_batches;
        self.failed_batches += other.failed_batches;
        self.dropped += other.dropped;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub sweep_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub time_filtered: StageReport,
    pub standard: StageReport,
    pub external_api: StageReport,
}

impl SweepReport {
    pub fn stage(&self, stage: SweepStage) -> &StageReport {
        match stage {
            SweepStage::TimeFiltered => &self.time_filtered,
            SweepStage::Standard => &self.standard,
            SweepStage::ExternalApi => &self.external_api,
        }
    }

    pub fn totals(&self) -> StageReport {
        let mut total = StageReport::default();
        total.merge(&self.time_filtered);
        total.merge(&self.standard);
        total.merge(&self.external_api);
        total
    }

    pub fn processed(&self) -> usize {
        self.totals().processed
    }

    pub fn added(&self) -> usize {
        self.totals().added
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Source {source_key} failed: {message}")]
    SourceFetch { source_key: String, message: String },

    #[error("Entry '{title}' skipped: {message}")]
    EntryProcessing { title: String, message: String },

    #[error("Commit of {batch_len} articles failed: {message}")]
    Commit { batch_len: usize, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

impl AggregatorError {
    pub fn entry(title: &str, message: impl Into<String>) -> Self {
        AggregatorError::EntryProcessing {
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn source(source_key: &str, message: impl Into<String>) -> Self {
        AggregatorError::SourceFetch {
            source_key: source_key.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
