//! Full-text resolution for linked articles.
//!
//! The strategy is picked from the link's path extension. Every failure
//! (timeout, missing converter, corrupt file) ends up as an empty string
//! in [`ContentResolver::resolve`]; callers fall back to feed text.

pub mod documents;
pub mod html;

use crate::config::ExtractionConfig;
use crate::fetcher::Fetcher;
use crate::traits::ContentExtractor;
use crate::types::{AggregatorError, Result};
use crate::utils::url::{extract_domain, is_http_url, path_extension};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Html,
    Pdf,
    Slides,
    Spreadsheet,
}

impl ContentKind {
    pub fn classify(url: &str) -> Self {
        match path_extension(url).as_deref() {
            Some("pdf") => ContentKind::Pdf,
            Some("ppt") | Some("pptx") => ContentKind::Slides,
            Some("xls") | Some("xlsx") => ContentKind::Spreadsheet,
            _ => ContentKind::Html,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Pdf => "pdf",
            ContentKind::Slides => "slides",
            ContentKind::Spreadsheet => "spreadsheet",
        }
    }
}

/// Extractor that downloads the document over HTTP.
pub struct HttpExtractor {
    fetcher: Arc<Fetcher>,
    config: ExtractionConfig,
}

impl HttpExtractor {
    pub fn new(fetcher: Arc<Fetcher>, config: ExtractionConfig) -> Self {
        Self { fetcher, config }
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn extract(&self, url: &str, kind: ContentKind) -> Result<String> {
        let timeout = self.config.render_timeout;

        match kind {
            ContentKind::Html => {
                let page = self.fetcher.fetch_page(url, timeout).await?;
                Ok(html::extract_from_html(&page))
            }
            ContentKind::Pdf => {
                let bytes = self.fetcher.fetch_bytes(url, timeout).await?;
                documents::pdf_text(bytes).await
            }
            ContentKind::Slides => {
                let bytes = self.fetcher.fetch_bytes(url, timeout).await?;
                tokio::task::spawn_blocking(move || documents::slides_text(&bytes))
                    .await
                    .map_err(|e| AggregatorError::Extraction(format!("slides worker failed: {}", e)))?
            }
            ContentKind::Spreadsheet => {
                let bytes = self.fetcher.fetch_bytes(url, timeout).await?;
                let extension = path_extension(url).unwrap_or_else(|| "xlsx".to_string());
                documents::spreadsheet_text(&bytes, &extension, &self.config).await
            }
        }
    }
}

/// Resolves a link to text, never failing.
#[derive(Clone)]
pub struct ContentResolver {
    extractor: Arc<dyn ContentExtractor>,
    timeout: Duration,
}

impl ContentResolver {
    pub fn new(extractor: Arc<dyn ContentExtractor>, timeout: Duration) -> Self {
        Self { extractor, timeout }
    }

    /// Extracted text, or an empty string on any failure.
    pub async fn resolve(&self, url: &str) -> String {
        if !is_http_url(url) {
            debug!("Not an http(s) link, skipping extraction: {}", url);
            return String::new();
        }

        let kind = ContentKind::classify(url);
        let domain = extract_domain(url).unwrap_or_default();
        debug!("Resolving {} as {}", url, kind.as_str());

        match tokio::time::timeout(self.timeout, self.extractor.extract(url, kind)).await {
            Ok(Ok(text)) => text.trim().to_string(),
            Ok(Err(e)) => {
                warn!(domain = %domain, "Extraction failed for {}: {}", url, e);
                String::new()
            }
            Err(_) => {
                warn!(domain = %domain, "Extraction timed out after {:?} for {}", self.timeout, url);
                String::new()
            }
        }
    }
}
