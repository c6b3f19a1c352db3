//! Static catalog of feed sources.
//!
//! Time-filterable sources encode the wanted date window in their query
//! string, so their URLs are rebuilt for every sweep. Their `key` stays the
//! same across sweeps and is what the validator cache is keyed by.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceClass {
    /// The query itself restricts results to a recent window.
    TimeFilterable,
    /// Returns whatever the publisher has; recency is checked per entry.
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPolicy {
    /// Resolve full text through the link's content kind.
    ClassifyByLink,
    /// Use only the text the feed entry carries.
    FeedTextOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub key: String,
    pub category: String,
    pub url: String,
    pub class: SourceClass,
    pub content: ContentPolicy,
}

impl SourceDescriptor {
    pub fn standard(key: &str, category: &str, url: &str) -> Self {
        Self {
            key: key.to_string(),
            category: category.to_string(),
            url: url.to_string(),
            class: SourceClass::Standard,
            content: ContentPolicy::ClassifyByLink,
        }
    }

    pub fn time_filterable(key: &str, category: &str, url: String) -> Self {
        Self {
            key: key.to_string(),
            category: category.to_string(),
            url,
            class: SourceClass::TimeFilterable,
            content: ContentPolicy::ClassifyByLink,
        }
    }

    pub fn with_content(mut self, content: ContentPolicy) -> Self {
        self.content = content;
        self
    }
}

pub const GOOGLE_NEWS_CATEGORY: &str = "google_news";

const GOOGLE_NEWS_SEARCH: &str = "https://news.google.com/rss/search";

struct SearchQuery {
    key: &'static str,
    terms: &'static str,
    locale: &'static str,
}

const EN_US: &str = "hl=en-US&gl=US&ceid=US:en";
const JA_JP: &str = "hl=ja&gl=JP&ceid=JP:ja";

const SEARCH_QUERIES: &[SearchQuery] = &[
    SearchQuery { key: "gnews:usd-jpy", terms: "USD+JPY+exchange+rate", locale: EN_US },
    SearchQuery { key: "gnews:eur-usd", terms: "EUR+USD+exchange+rate", locale: EN_US },
    SearchQuery { key: "gnews:fed-decision", terms: "Federal+Reserve+rate+decision", locale: EN_US },
    SearchQuery { key: "gnews:us-cpi", terms: "US+inflation+CPI", locale: EN_US },
    SearchQuery { key: "gnews:nfp", terms: "nonfarm+payrolls", locale: EN_US },
    SearchQuery { key: "gnews:ecb-lagarde", terms: "ECB+Lagarde", locale: EN_US },
    SearchQuery { key: "gnews:eur-inflation", terms: "EUR+inflation", locale: EN_US },
    SearchQuery { key: "gnews:boj-intervention", terms: "日銀+為替介入", locale: JA_JP },
    SearchQuery { key: "gnews:weak-yen", terms: "円安", locale: JA_JP },
    SearchQuery { key: "gnews:rate-gap", terms: "日米金利差", locale: JA_JP },
];

const STANDARD_FEEDS: &[(&str, &str, &str)] = &[
    ("boj:whatsnew", "official_sources", "https://www.boj.or.jp/rss/whatsnew.rdf"),
    ("mof:press", "official_sources", "https://www.mof.go.jp/public_relations/rss.xml"),
    ("fed:press", "official_sources", "https://www.federalreserve.gov/feeds/pressreleases.xml"),
    ("treasury:press", "official_sources", "https://home.treasury.gov/news/press-releases/feed"),
    ("ecb:press", "official_sources", "https://www.ecb.europa.eu/press/rss/pr.xml"),
    ("economist:finance", "international_media_en", "https://www.economist.com/finance-and-economics/rss.xml"),
    ("nikkei:top", "domestic_media_jp", "https://www.nikkei.com/rss/newselement/Nni01.xml"),
];

/// Search URL restricted to `[now - hours_back - 1 day, now + 1 day]`.
///
/// The search backend only understands whole dates, hence the extra day on
/// both sides.
pub fn search_url(terms: &str, locale: &str, now: DateTime<Utc>, hours_back: i64) -> String {
    let after = (now - Duration::hours(hours_back) - Duration::days(1)).format("%Y-%m-%d");
    let before = (now + Duration::days(1)).format("%Y-%m-%d");
    format!(
        "{}?q={}+after:{}+before:{}&{}",
        GOOGLE_NEWS_SEARCH, terms, after, before, locale
    )
}

pub struct FeedRegistry {
    hours_back: i64,
    fixed: Option<Vec<SourceDescriptor>>,
}

impl FeedRegistry {
    pub fn new(hours_back: i64) -> Self {
        Self {
            hours_back,
            fixed: None,
        }
    }

    /// Registry that returns exactly `sources` on every sweep.
    pub fn fixed(sources: Vec<SourceDescriptor>) -> Self {
        Self {
            hours_back: 24,
            fixed: Some(sources),
        }
    }

    pub fn time_filtered(&self, now: DateTime<Utc>) -> Vec<SourceDescriptor> {
        SEARCH_QUERIES
            .iter()
            .map(|q| {
                SourceDescriptor::time_filterable(
                    q.key,
                    GOOGLE_NEWS_CATEGORY,
                    search_url(q.terms, q.locale, now, self.hours_back),
                )
            })
            .collect()
    }

    pub fn standard(&self) -> Vec<SourceDescriptor> {
        STANDARD_FEEDS
            .iter()
            .map(|(key, category, url)| SourceDescriptor::standard(key, category, url))
            .collect()
    }

    /// Every source for a sweep starting at `now`.
    pub fn catalog(&self, now: DateTime<Utc>) -> Vec<SourceDescriptor> {
        if let Some(fixed) = &self.fixed {
            return fixed.clone();
        }
        let mut all = self.time_filtered(now);
        all.extend(self.standard());
        all
    }
}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::new(24)
    }
}
