#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fx_news_aggregator::{
    AggregatorError, ApiNewsItem, ApiStage, ArticleStore, CollectorConfig, ContentExtractor, ContentKind,
    FeedClient, FeedRegistry, FetchOutcome, NewsApi, NewsCollector, Result, SourceDescriptor, Summarizer,
    TimeWindow,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Fixed sweep time shared by the collector tests.
pub fn sweep_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    sweep_time() - Duration::hours(hours)
}

pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    pub fn new(title: &str, link: &str, published: Option<DateTime<Utc>>) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            description: None,
            published,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// RSS 2.0 document carrying `items`.
pub fn rss_document(items: &[FeedItem]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test Feed</title><link>https://feeds.example.com/</link><description>test</description>"#,
    );

    for item in items {
        body.push_str("<item>");
        body.push_str(&format!("<title>{}</title>", escape(&item.title)));
        body.push_str(&format!("<link>{}</link>", escape(&item.link)));
        if let Some(description) = &item.description {
            body.push_str(&format!("<description>{}</description>", escape(description)));
        }
        if let Some(published) = item.published {
            body.push_str(&format!("<pubDate>{}</pubDate>", published.to_rfc2822()));
        }
        body.push_str("</item>");
    }

    body.push_str("</channel></rss>");
    body
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[derive(Debug, Clone)]
pub enum StubResponse {
    Body {
        body: String,
        etag: Option<String>,
        last_modified: Option<String>,
    },
    NotModified,
    Fail(String),
}

impl StubResponse {
    pub fn body(body: String) -> Self {
        StubResponse::Body {
            body,
            etag: None,
            last_modified: None,
        }
    }

    pub fn tagged(body: String, etag: &str, last_modified: &str) -> Self {
        StubResponse::Body {
            body,
            etag: Some(etag.to_string()),
            last_modified: Some(last_modified.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Feed transport that replays queued responses per URL.
#[derive(Default)]
pub struct StubFeedClient {
    responses: Mutex<HashMap<String, VecDeque<StubResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubFeedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: &str, response: StubResponse) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedClient for StubFeedClient {
    async fn fetch_feed(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchOutcome> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            etag: etag.map(str::to_string),
            last_modified: last_modified.map(str::to_string),
        });

        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(StubResponse::Body {
                body,
                etag,
                last_modified,
            }) => Ok(FetchOutcome::Fetched {
                body,
                etag,
                last_modified,
            }),
            Some(StubResponse::NotModified) => Ok(FetchOutcome::NotModified),
            Some(StubResponse::Fail(message)) => Err(AggregatorError::General(message)),
            None => Err(AggregatorError::General(format!("no stubbed response for {}", url))),
        }
    }
}

/// Extractor that returns canned text per URL and records every call.
#[derive(Default)]
pub struct StubExtractor {
    texts: Mutex<HashMap<String, std::result::Result<String, String>>>,
    calls: Mutex<Vec<(String, ContentKind)>>,
    delay: Mutex<Option<std::time::Duration>>,
}

impl StubExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every extraction take `delay`.
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn text(&self, url: &str, text: &str) {
        self.texts.lock().unwrap().insert(url.to_string(), Ok(text.to_string()));
    }

    pub fn fail(&self, url: &str, message: &str) {
        self.texts
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<(String, ContentKind)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|(url, _)| url).collect()
    }
}

#[async_trait]
impl ContentExtractor for StubExtractor {
    async fn extract(&self, url: &str, kind: ContentKind) -> Result<String> {
        self.calls.lock().unwrap().push((url.to_string(), kind));

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.texts.lock().unwrap().get(url) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(AggregatorError::Extraction(message.clone())),
            None => Ok(String::new()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SummaryMode {
    /// "summary: " followed by the input.
    Echo,
    Fail,
    Empty,
}

pub struct StubSummarizer {
    mode: SummaryMode,
    inputs: Mutex<Vec<String>>,
}

impl StubSummarizer {
    pub fn new(mode: SummaryMode) -> Self {
        Self {
            mode,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    fn summarizer_name(&self) -> String {
        format!("stub ({:?})", self.mode)
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        self.inputs.lock().unwrap().push(text.to_string());
        match self.mode {
            SummaryMode::Echo => Ok(format!("summary: {}", text)),
            SummaryMode::Fail => Err(AggregatorError::General("model offline".to_string())),
            SummaryMode::Empty => Ok("   ".to_string()),
        }
    }
}

/// News API returning the same items on every call.
pub struct StubNewsApi {
    items: Vec<ApiNewsItem>,
    fail: bool,
    windows: Mutex<Vec<TimeWindow>>,
}

impl StubNewsApi {
    pub fn new(items: Vec<ApiNewsItem>) -> Self {
        Self {
            items,
            fail: false,
            windows: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            items: Vec::new(),
            fail: true,
            windows: Mutex::new(Vec::new()),
        }
    }

    pub fn windows(&self) -> Vec<TimeWindow> {
        self.windows.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsApi for StubNewsApi {
    fn name(&self) -> &str {
        "stub-api"
    }

    async fn fetch_news(&self, window: &TimeWindow, limit: usize) -> anyhow::Result<Vec<ApiNewsItem>> {
        self.windows.lock().unwrap().push(*window);
        if self.fail {
            anyhow::bail!("upstream returned 502");
        }
        Ok(self.items.iter().take(limit).cloned().collect())
    }
}

pub fn api_item(headline: &str, url: &str, summary: &str, minutes_ago: i64) -> ApiNewsItem {
    ApiNewsItem {
        headline: headline.to_string(),
        url: url.to_string(),
        summary: summary.to_string(),
        source: "Reuters".to_string(),
        datetime: (sweep_time() - Duration::minutes(minutes_ago)).timestamp(),
        category: "forex".to_string(),
    }
}

pub struct Harness {
    pub collector: NewsCollector,
    pub client: Arc<StubFeedClient>,
    pub extractor: Arc<StubExtractor>,
    pub summarizer: Arc<StubSummarizer>,
}

impl Harness {
    pub fn store(&self) -> &ArticleStore {
        self.collector.store()
    }
}

pub fn test_config() -> CollectorConfig {
    let mut config = CollectorConfig::default();
    config.extraction.workers = 2;
    config.source_budget = std::time::Duration::from_secs(10);
    config
}

pub async fn harness(
    config: CollectorConfig,
    sources: Vec<SourceDescriptor>,
    summary: SummaryMode,
    api: ApiStage,
) -> Harness {
    let store = ArticleStore::in_memory().await.unwrap();
    harness_with_store(config, store, sources, summary, api)
}

pub fn harness_with_store(
    config: CollectorConfig,
    store: ArticleStore,
    sources: Vec<SourceDescriptor>,
    summary: SummaryMode,
    api: ApiStage,
) -> Harness {
    let client = Arc::new(StubFeedClient::new());
    let extractor = Arc::new(StubExtractor::new());
    let summarizer = Arc::new(StubSummarizer::new(summary));

    let collector = NewsCollector::new(
        config,
        store,
        client.clone(),
        extractor.clone(),
        summarizer.clone(),
        api,
    )
    .with_registry(FeedRegistry::fixed(sources));

    Harness {
        collector,
        client,
        extractor,
        summarizer,
    }
}

pub fn no_api() -> ApiStage {
    ApiStage::Unavailable("FINNHUB_API_KEY is not set".to_string())
}

/// One request as the canned server received it.
#[derive(Debug, Clone)]
pub struct ServedRequest {
    /// Request line and headers, lowercased.
    pub head: String,
    pub at: std::time::Instant,
}

/// A local HTTP listener that answers each connection with the next canned
/// response. The last response repeats once the queue runs dry.
pub struct CannedServer {
    addr: std::net::SocketAddr,
    served: Arc<Mutex<Vec<ServedRequest>>>,
}

impl CannedServer {
    pub async fn start(responses: Vec<Vec<u8>>) -> Self {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let served = Arc::new(Mutex::new(Vec::new()));
        let log = served.clone();

        tokio::spawn(async move {
            let mut responses: VecDeque<Vec<u8>> = responses.into();
            while let Ok((mut socket, _)) = listener.accept().await {
                let response = if responses.len() > 1 {
                    responses.pop_front().unwrap_or_default()
                } else {
                    responses.front().cloned().unwrap_or_default()
                };
                let log = log.clone();
                tokio::spawn(async move {
                    let head = read_request_head(&mut socket).await;
                    log.lock().unwrap().push(ServedRequest {
                        head,
                        at: std::time::Instant::now(),
                    });
                    // the client may hang up early on oversized bodies
                    let _ = socket.write_all(&response).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, served }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn served(&self) -> Vec<ServedRequest> {
        self.served.lock().unwrap().clone()
    }
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) -> String {
    use tokio::io::AsyncReadExt;

    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                head.extend_from_slice(&buf[..n]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&head).to_lowercase()
}

/// A complete response with `Content-Length` and `Connection: close`.
pub fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for (name, value) in headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str("\r\n");
    response.push_str(body);
    response.into_bytes()
}

/// A 200 whose body is delimited by connection close, so no length is announced.
pub fn unannounced_body(len: usize) -> Vec<u8> {
    let mut response = b"HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nConnection: close\r\n\r\n".to_vec();
    response.extend(std::iter::repeat(b'a').take(len));
    response
}
