use crate::traits::FeedClient;
use crate::types::{AggregatorError, FetchConfig, FetchOutcome, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, Response, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::Url;

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    rate_limiter: Arc<RwLock<HashMap<String, Instant>>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch a feed document, retrying transport errors and server errors
    /// with exponential backoff.
    pub async fn fetch_document(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchOutcome> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        self.apply_rate_limit(url).await?;

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_millis(self.config.retry_delay_ms),
            initial_interval: Duration::from_millis(self.config.retry_delay_ms),
            max_interval: Duration::from_millis(self.config.retry_delay_ms * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_millis(self.config.retry_delay_ms * 60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.fetch_with_conditional_headers(url, etag, last_modified).await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::NOT_MODIFIED {
                        debug!("Feed not modified: {}", url);
                        return Ok(FetchOutcome::NotModified);
                    }

                    if !status.is_success() {
                        let err = AggregatorError::source(
                            url,
                            format!("HTTP {}: {}", status, status.canonical_reason().unwrap_or("Unknown")),
                        );
                        if !is_retryable(status) {
                            return Err(err);
                        }
                        last_error = Some(err);
                    } else {
                        let new_etag = header_value(&response, "etag");
                        let new_last_modified = header_value(&response, "last-modified");

                        let bytes = self.read_limited(response).await?;
                        let body = String::from_utf8_lossy(&bytes).into_owned();
                        info!(
                            "Fetched feed: {} ({} bytes in {}ms)",
                            url,
                            body.len(),
                            start_time.elapsed().as_millis()
                        );
                        return Ok(FetchOutcome::Fetched {
                            body,
                            etag: new_etag,
                            last_modified: new_last_modified,
                        });
                    }
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
            break;
        }

        error!("Failed to fetch feed after {} attempts: {}", self.config.max_retries + 1, url);
        Err(last_error.unwrap_or_else(|| AggregatorError::source(url, "unknown error")))
    }

    async fn fetch_with_conditional_headers(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<Response> {
        let mut request = self.client.get(url);

        if let Some(etag) = etag {
            request = request.header("If-None-Match", etag);
        }

        if let Some(last_modified) = last_modified {
            request = request.header("If-Modified-Since", last_modified);
        }

        let response = request.send().await?;
        Ok(response)
    }

    // Reads the body while enforcing `max_feed_size_mb`, whether or not the
    // server announced a length.
    async fn read_limited(&self, mut response: Response) -> Result<Vec<u8>> {
        let limit = self.config.max_feed_size_mb * 1024 * 1024;

        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit {
                return Err(AggregatorError::FeedTooLarge {
                    size_mb: content_length as usize / (1024 * 1024),
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() > limit {
                return Err(AggregatorError::FeedTooLarge {
                    size_mb: body.len() / (1024 * 1024),
                });
            }
        }
        Ok(body)
    }

    async fn apply_rate_limit(&self, url: &str) -> Result<()> {
        let parsed_url = Url::parse(url)?;
        let host = parsed_url.host_str().unwrap_or("").to_string();
        let min_interval = Duration::from_millis(self.config.min_host_interval_ms);

        let wait_time = {
            let mut rate_limiter = self.rate_limiter.write().await;
            let now = Instant::now();

            // the map holds the last reserved slot, which may lie in the future
            let next_slot = rate_limiter
                .get(&host)
                .map(|last| *last + min_interval)
                .unwrap_or(now);
            let wait_time = next_slot.saturating_duration_since(now);

            rate_limiter.insert(host.clone(), now + wait_time);
            wait_time
        };

        if !wait_time.is_zero() {
            debug!("Rate limiting {}: waiting {:?}", host, wait_time);
            tokio::time::sleep(wait_time).await;
        }

        Ok(())
    }

    /// Raw bytes of a linked document, bounded by `timeout` and the size limit.
    pub async fn fetch_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        debug!("Fetching document from: {}", url);
        self.apply_rate_limit(url).await?;

        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(AggregatorError::General(format!(
                    "HTTP {}: {}",
                    status,
                    status.canonical_reason().unwrap_or("Unknown")
                )));
            }
            self.read_limited(response).await
        };

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(AggregatorError::Timeout {
                operation: format!("fetch {}", url),
                seconds: timeout.as_secs(),
            }),
        }
    }

    /// A web page decoded as text.
    pub async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String> {
        let bytes = self.fetch_bytes(url, timeout).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait]
impl FeedClient for Fetcher {
    async fn fetch_feed(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchOutcome> {
        self.fetch_document(url, etag, last_modified).await
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::REQUEST_TIMEOUT
}

fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
