use crate::credentials::ApiCredential;
use crate::error::{NewsApiError, Result};
use crate::relevance::is_currency_related;
use async_trait::async_trait;
use interfaces::{ApiNewsItem, NewsApi, TimeWindow};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

#[derive(Debug, Clone)]
pub struct FinnhubConfig {
    pub base_url: String,
    pub categories: Vec<String>,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for FinnhubConfig {
    fn default() -> Self {
        Self {
            base_url: FINNHUB_BASE_URL.to_string(),
            categories: vec!["forex".to_string(), "general".to_string()],
            timeout_seconds: 30,
            user_agent: "FX-News-Aggregator/1.0".to_string(),
        }
    }
}

// Wire shape of one element of the `/news` response array.
#[derive(Debug, Deserialize)]
struct RawNewsItem {
    #[serde(default)]
    category: String,
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
}

impl From<RawNewsItem> for ApiNewsItem {
    fn from(raw: RawNewsItem) -> Self {
        Self {
            headline: raw.headline.trim().to_string(),
            url: raw.url.trim().to_string(),
            summary: raw.summary.trim().to_string(),
            source: raw.source,
            datetime: raw.datetime,
            category: raw.category,
        }
    }
}

pub struct FinnhubClient {
    client: Client,
    credential: ApiCredential,
    config: FinnhubConfig,
}

impl FinnhubClient {
    pub fn new(credential: ApiCredential, config: FinnhubConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        info!("Finnhub client initialized with key {}", credential.redacted());
        Ok(Self { client, credential, config })
    }

    /// Client configured from `FINNHUB_API_KEY` and default settings.
    pub fn from_env() -> Result<Self> {
        Self::new(ApiCredential::from_env()?, FinnhubConfig::default())
    }

    /// Raw market news for one category between two unix timestamps.
    pub async fn get_market_news(&self, category: &str, from: i64, to: i64) -> Result<Vec<ApiNewsItem>> {
        let url = Url::parse(&format!("{}/news", self.config.base_url.trim_end_matches('/')))?;

        debug!("Fetching {} news from Finnhub ({} .. {})", category, from, to);

        let response = self
            .client
            .get(url)
            .query(&[
                ("category", category.to_string()),
                ("token", self.credential.api_key().to_string()),
                ("from", from.to_string()),
                ("to", to.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let payload: serde_json::Value = response.json().await?;
        let items: Vec<RawNewsItem> = match payload {
            serde_json::Value::Array(_) => serde_json::from_value(payload)
                .map_err(|e| NewsApiError::UnexpectedPayload(e.to_string()))?,
            other => {
                return Err(NewsApiError::UnexpectedPayload(format!(
                    "expected an array, got {}",
                    json_kind(&other)
                )))
            }
        };

        Ok(items.into_iter().map(ApiNewsItem::from).collect())
    }

    /// Forex-relevant news across all configured categories.
    ///
    /// A failing category is logged and skipped; the call only fails when
    /// every category failed.
    pub async fn get_forex_news(&self, window: &TimeWindow, limit: usize) -> Result<Vec<ApiNewsItem>> {
        let categories = &self.config.categories;
        let per_category = (limit / categories.len().max(1)).max(1);

        let mut collected = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0usize;

        for category in categories {
            match self.get_market_news(category, window.from_unix(), window.to_unix()).await {
                Ok(items) => {
                    succeeded += 1;
                    let in_window: Vec<ApiNewsItem> = items
                        .into_iter()
                        .filter(|item| window.contains_unix(item.datetime))
                        .take(per_category)
                        .collect();
                    info!("Retrieved {} {} items from Finnhub", in_window.len(), category);
                    collected.extend(in_window);
                }
                Err(e) => {
                    warn!("Finnhub {} request failed: {}", category, e);
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(select_items(collected, window, limit))
    }
}

/// Post-filter a raw pull: keep items inside `window` that carry a url,
/// drop repeated urls, keep only currency-related items, newest first,
/// truncated to `limit`.
pub fn select_items(items: Vec<ApiNewsItem>, window: &TimeWindow, limit: usize) -> Vec<ApiNewsItem> {
    let mut seen_urls = HashSet::new();
    let mut selected: Vec<ApiNewsItem> = items
        .into_iter()
        .filter(|item| window.contains_unix(item.datetime))
        .filter(|item| !item.url.is_empty())
        .filter(|item| seen_urls.insert(item.url.clone()))
        .filter(is_currency_related)
        .collect();

    // stable, so equal timestamps keep arrival order
    selected.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    selected.truncate(limit);
    selected
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[async_trait]
impl NewsApi for FinnhubClient {
    fn name(&self) -> &str {
        "finnhub"
    }

    async fn fetch_news(&self, window: &TimeWindow, limit: usize) -> anyhow::Result<Vec<ApiNewsItem>> {
        Ok(self.get_forex_news(window, limit).await?)
    }
}
