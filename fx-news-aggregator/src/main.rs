use anyhow::Context;
use clap::Parser;
use fx_news_aggregator::store::DEFAULT_DATABASE_URL;
use fx_news_aggregator::{
    ApiStage, ArticleStore, CollectorConfig, Fetcher, HttpExtractor, LlmSummarizer, LlmSummarizerConfig,
    NewsCollector, Summarizer, SweepScheduler, TruncatingSummarizer,
};
use news_api_ingestion::FinnhubClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fx-news-aggregator", about = "Collects forex news into a tagged article store")]
struct Args {
    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    /// Run a single sweep and exit
    #[arg(long)]
    once: bool,

    #[arg(long, env = "SWEEP_INTERVAL_MINUTES", default_value_t = 10)]
    interval_minutes: u64,

    #[arg(long, default_value_t = 10)]
    feed_batch_size: usize,

    #[arg(long, default_value_t = 5)]
    api_batch_size: usize,

    /// Concurrent extraction workers per source
    #[arg(long, default_value_t = 4)]
    workers: usize,

    #[arg(long, default_value_t = 50)]
    api_limit: usize,

    #[arg(long, default_value_t = 30)]
    api_minutes_back: i64,

    /// OpenAI-compatible endpoint used for summaries; summaries are truncated text when unset
    #[arg(long, env = "SUMMARIZER_URL")]
    summarizer_url: Option<String>,

    #[arg(long, env = "SUMMARIZER_MODEL", default_value = "qwen3-4b")]
    summarizer_model: String,

    #[arg(long, env = "SUMMARIZER_API_KEY", hide_env_values = true)]
    summarizer_api_key: Option<String>,

    /// Office binary used to convert spreadsheets
    #[arg(long, env = "OFFICE_BINARY", default_value = "soffice")]
    office_binary: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    info!("Starting FX news aggregator");

    let mut config = CollectorConfig::default();
    config.batch_sizes.feed = args.feed_batch_size;
    config.batch_sizes.api = args.api_batch_size;
    config.extraction.workers = args.workers;
    config.extraction.office_binary = args.office_binary.into();
    config.api_limit = args.api_limit;
    config.api_minutes_back = args.api_minutes_back;
    config.interval = Duration::from_secs(args.interval_minutes * 60);

    let store = ArticleStore::connect(&args.database_url)
        .await
        .with_context(|| format!("opening database {}", args.database_url))?;

    let fetcher = Arc::new(Fetcher::new(config.fetch.clone()).context("building HTTP client")?);
    let extractor = Arc::new(HttpExtractor::new(fetcher.clone(), config.extraction.clone()));

    let summarizer: Arc<dyn Summarizer> = match args.summarizer_url {
        Some(endpoint) => {
            let mut llm = LlmSummarizerConfig::new(endpoint, args.summarizer_model);
            llm.api_key = args.summarizer_api_key;
            Arc::new(LlmSummarizer::new(llm).context("building summarizer client")?)
        }
        None => {
            warn!("SUMMARIZER_URL not set, summaries will be truncated article text");
            Arc::new(TruncatingSummarizer::new(config.summary_fallback_chars))
        }
    };

    let api = match FinnhubClient::from_env() {
        Ok(client) => ApiStage::Ready(Arc::new(client)),
        Err(e) => {
            warn!("News API stage disabled: {}", e);
            ApiStage::Unavailable(e.to_string())
        }
    };

    let interval = config.interval;
    let collector = NewsCollector::new(config, store, fetcher, extractor, summarizer, api);

    if args.once {
        let report = collector.run_sweep().await;
        info!("Processed {}, added {}", report.processed(), report.added());
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let sweeps = SweepScheduler::new(interval).run_until(&collector, shutdown).await;
    info!("FX news aggregator stopped after {} sweeps", sweeps);
    Ok(())
}
