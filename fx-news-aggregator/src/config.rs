use crate::types::FetchConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Commit thresholds per source class.
#[derive(Debug, Clone, Copy)]
pub struct BatchSizes {
    /// Feed entries are cheap, so they are committed in larger groups.
    pub feed: usize,
    pub api: usize,
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self { feed: 10, api: 5 }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub render_timeout: Duration,
    pub conversion_timeout: Duration,
    /// Binary used to convert spreadsheets to PDF.
    pub office_binary: PathBuf,
    pub workers: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            render_timeout: Duration::from_secs(30),
            conversion_timeout: Duration::from_secs(60),
            office_binary: PathBuf::from("soffice"),
            workers: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub fetch: FetchConfig,
    pub batch_sizes: BatchSizes,
    pub extraction: ExtractionConfig,
    /// Standard-feed entries older than this are dropped before extraction.
    pub recency_hours: i64,
    pub api_minutes_back: i64,
    pub api_limit: usize,
    pub api_category: String,
    /// API summaries at or below this length are stored as-is.
    pub api_summarize_threshold: usize,
    /// Upper bound on the time spent on one source, fetch included.
    pub source_budget: Duration,
    pub summary_fallback_chars: usize,
    pub interval: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            batch_sizes: BatchSizes::default(),
            extraction: ExtractionConfig::default(),
            recency_hours: 24,
            api_minutes_back: 30,
            api_limit: 50,
            api_category: "finnhub_forex".to_string(),
            api_summarize_threshold: 100,
            source_budget: Duration::from_secs(300),
            summary_fallback_chars: 400,
            interval: Duration::from_secs(10 * 60),
        }
    }
}

impl CollectorConfig {
    pub fn recency_horizon(&self) -> chrono::Duration {
        chrono::Duration::hours(self.recency_hours)
    }

    pub fn api_window_length(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.api_minutes_back)
    }
}
