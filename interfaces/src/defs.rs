use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The currencies an article can be tagged with.
///
/// Variant order is the declared tag universe order; tag lists are always
/// reported in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyTag {
    Usd,
    Eur,
    Jpy,
}

impl CurrencyTag {
    pub const ALL: [CurrencyTag; 3] = [CurrencyTag::Usd, CurrencyTag::Eur, CurrencyTag::Jpy];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyTag::Usd => "USD",
            CurrencyTag::Eur => "EUR",
            CurrencyTag::Jpy => "JPY",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for CurrencyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted news article. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub category: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub published: DateTime<Utc>,
    pub currency_tags: Vec<CurrencyTag>,
    pub created_at: DateTime<Utc>,
}

/// An accepted article waiting for its batch to be committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub category: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub published: DateTime<Utc>,
    pub currency_tags: Vec<CurrencyTag>,
}

/// One item returned by a REST news API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiNewsItem {
    pub headline: String,
    pub url: String,
    pub summary: String,
    pub source: String,
    /// Unix seconds. Zero when the provider did not report a time.
    pub datetime: i64,
    pub category: String,
}

/// Closed time window `[from, to]` used to query pull-based sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn ending_at(to: DateTime<Utc>, length: chrono::Duration) -> Self {
        Self { from: to - length, to }
    }

    pub fn from_unix(&self) -> i64 {
        self.from.timestamp()
    }

    pub fn to_unix(&self) -> i64 {
        self.to.timestamp()
    }

    pub fn contains_unix(&self, ts: i64) -> bool {
        self.from_unix() <= ts && ts <= self.to_unix()
    }
}

// Sources are pulled, never pushed. Implementations hold their own client
// and credentials and are shared behind an `Arc` by the collector.

#[async_trait]
pub trait NewsApi: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Items published inside `window`, newest first, at most `limit`.
    async fn fetch_news(&self, window: &TimeWindow, limit: usize) -> anyhow::Result<Vec<ApiNewsItem>>;
}
