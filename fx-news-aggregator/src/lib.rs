pub mod batch;
pub mod collector;
pub mod conditional;
pub mod config;
pub mod dedup;
pub mod extraction;
pub mod feed_cache;
pub mod fetcher;
pub mod normalizer;
pub mod parser;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod summarizer;
pub mod tagger;
pub mod traits;
pub mod types;
pub mod utils;

pub use types::*;
pub use batch::BatchWriter;
pub use collector::{ApiStage, NewsCollector};
pub use conditional::{ConditionalFetcher, SourceFetch};
pub use config::{BatchSizes, CollectorConfig, ExtractionConfig};
pub use dedup::{DedupKey, Deduplicator};
pub use extraction::{ContentKind, ContentResolver, HttpExtractor};
pub use feed_cache::{FeedCacheEntry, FeedCacheStore};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use registry::{ContentPolicy, FeedRegistry, SourceClass, SourceDescriptor};
pub use scheduler::SweepScheduler;
pub use store::{ArticleQuery, ArticleStore};
pub use summarizer::{LlmSummarizer, LlmSummarizerConfig, Summarizer, TruncatingSummarizer};
pub use tagger::detect_tags;
pub use traits::{ContentExtractor, FeedClient};
