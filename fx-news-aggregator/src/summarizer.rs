use crate::types::{AggregatorError, Result};
use crate::utils::text::truncate_chars;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Condenses article text into a short synopsis.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Name used in logs.
    fn summarizer_name(&self) -> String;

    /// Summarize `text`. Implementations must accept input of any length.
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Returns the leading part of the input. Used when no model endpoint is configured.
pub struct TruncatingSummarizer {
    max_chars: usize,
}

impl TruncatingSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

#[async_trait]
impl Summarizer for TruncatingSummarizer {
    fn summarizer_name(&self) -> String {
        format!("truncating ({} chars)", self.max_chars)
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        Ok(truncate_chars(text, self.max_chars))
    }
}

pub const DEFAULT_SUMMARY_PROMPT: &str = "You are a financial news analyst. Summarize the following article in Japanese in at most three sentences. \
State only facts written in the article, with no opinion or speculation. \
Keep dates, places, people, institutions and figures that can move currency markets. \
If only a headline is given, summarize the headline.";

#[derive(Debug, Clone)]
pub struct LlmSummarizerConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `http://localhost:8000/v1`.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_input_chars: usize,
    pub max_output_tokens: u32,
    pub system_prompt: String,
}

impl LlmSummarizerConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            timeout: Duration::from_secs(60),
            max_input_chars: 6000,
            max_output_tokens: 512,
            system_prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat-completions client for an OpenAI-compatible model server.
pub struct LlmSummarizer {
    client: Client,
    config: LlmSummarizerConfig,
}

impl LlmSummarizer {
    pub fn new(config: LlmSummarizerConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    fn summarizer_name(&self) -> String {
        format!("llm ({})", self.config.model)
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        // long articles are cut before they reach the model
        let input = truncate_chars(text, self.config.max_input_chars);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &input,
                },
            ],
            max_tokens: self.config.max_output_tokens,
            temperature: 0.2,
        };

        let mut builder = self.client.post(self.completions_url()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let call = async move {
            let response = builder.send().await?.error_for_status()?;
            let body: ChatResponse = response.json().await?;
            Ok::<_, AggregatorError>(body)
        };

        let body = tokio::time::timeout(self.config.timeout, call)
            .await
            .map_err(|_| AggregatorError::Timeout {
                operation: "summarization".to_string(),
                seconds: self.config.timeout.as_secs(),
            })??;

        let summary = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        debug!("Model returned {} chars", summary.chars().count());
        Ok(summary)
    }
}

/// Summary of `text` that is never empty for non-empty input.
///
/// Errors and empty model output fall back to the first
/// `fallback_chars` characters of `text`.
pub async fn summarize_with_fallback(summarizer: &dyn Summarizer, text: &str, fallback_chars: usize) -> String {
    match summarizer.summarize(text).await {
        Ok(summary) if !summary.trim().is_empty() => summary,
        Ok(_) => {
            warn!("{} returned an empty summary, using original text", summarizer.summarizer_name());
            truncate_chars(text, fallback_chars)
        }
        Err(e) => {
            warn!("{} failed: {}, using original text", summarizer.summarizer_name(), e);
            truncate_chars(text, fallback_chars)
        }
    }
}
