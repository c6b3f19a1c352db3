use crate::batch::BatchWriter;
use crate::conditional::{ConditionalFetcher, SourceFetch};
use crate::config::CollectorConfig;
use crate::dedup::{DedupPolicy, Deduplicator};
use crate::extraction::ContentResolver;
use crate::feed_cache::FeedCacheStore;
use crate::normalizer::{EntryNormalizer, Normalized};
use crate::registry::{ContentPolicy, FeedRegistry, SourceClass, SourceDescriptor};
use crate::store::ArticleStore;
use crate::summarizer::{summarize_with_fallback, Summarizer};
use crate::tagger::detect_tags;
use crate::traits::{ContentExtractor, FeedClient};
use crate::types::{CandidateEntry, NewsApi, StageReport, SweepReport, SweepStage, TimeWindow};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Whether the external news API takes part in sweeps.
#[derive(Clone)]
pub enum ApiStage {
    Ready(Arc<dyn NewsApi>),
    /// Configuration is missing or invalid; the stage is skipped every sweep.
    Unavailable(String),
}

// How a candidate's body text and summary are produced.
#[derive(Debug, Clone, Copy)]
enum Enrichment {
    Feed(ContentPolicy),
    Api,
}

pub struct NewsCollector {
    config: CollectorConfig,
    registry: FeedRegistry,
    fetcher: ConditionalFetcher,
    resolver: ContentResolver,
    summarizer: Arc<dyn Summarizer>,
    store: ArticleStore,
    api: ApiStage,
}

impl NewsCollector {
    pub fn new(
        config: CollectorConfig,
        store: ArticleStore,
        feed_client: Arc<dyn FeedClient>,
        extractor: Arc<dyn ContentExtractor>,
        summarizer: Arc<dyn Summarizer>,
        api: ApiStage,
    ) -> Self {
        let registry = FeedRegistry::new(config.recency_hours);
        let fetcher = ConditionalFetcher::new(feed_client, FeedCacheStore::new());
        // render wait plus headroom for conversion of office documents
        let resolver = ContentResolver::new(
            extractor,
            config.extraction.render_timeout + config.extraction.conversion_timeout,
        );

        Self {
            config,
            registry,
            fetcher,
            resolver,
            summarizer,
            store,
            api,
        }
    }

    /// Replace the built-in source catalog.
    pub fn with_registry(mut self, registry: FeedRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    pub fn feed_cache(&self) -> &FeedCacheStore {
        self.fetcher.cache()
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub async fn run_sweep(&self) -> SweepReport {
        self.run_sweep_at(Utc::now()).await
    }

    /// One pass over every source, treating `now` as the current time.
    ///
    /// Never fails: fetch, entry and commit errors are logged and counted
    /// in the returned report.
    pub async fn run_sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let sweep_id = Uuid::new_v4();
        let span = info_span!("sweep", %sweep_id);

        async move {
            info!("Starting news sweep");
            let started_at = Utc::now();

            let catalog = self.registry.catalog(now);
            let (time_filtered, standard): (Vec<_>, Vec<_>) = catalog
                .into_iter()
                .partition(|s| s.class == SourceClass::TimeFilterable);

            let mut dedup = Deduplicator::new(self.store.clone());

            let time_filtered = self
                .run_feed_stage(SweepStage::TimeFiltered, &time_filtered, now, &mut dedup)
                .await;
            let standard = self
                .run_feed_stage(SweepStage::Standard, &standard, now, &mut dedup)
                .await;
            let external_api = self.run_api_stage(now, &mut dedup).await;

            let report = SweepReport {
                sweep_id,
                started_at,
                finished_at: Utc::now(),
                time_filtered,
                standard,
                external_api,
            };

            let totals = report.totals();
            info!(
                "News sweep completed. Total processed: {}, Added: {} (duplicates {}, stale {}, failed entries {}, failed sources {}, failed batches {})",
                totals.processed,
                totals.added,
                totals.duplicates,
                totals.stale,
                totals.failed_entries,
                totals.failed_sources,
                totals.failed_batches
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn run_feed_stage(
        &self,
        stage: SweepStage,
        sources: &[SourceDescriptor],
        now: DateTime<Utc>,
        dedup: &mut Deduplicator,
    ) -> StageReport {
        let mut report = StageReport::default();
        let mut writer = BatchWriter::new(self.store.clone(), self.config.batch_sizes.feed);
        let normalizer = EntryNormalizer::new(now, self.config.recency_horizon());

        info!("Stage {}: {} sources", stage.as_str(), sources.len());

        for source in sources {
            report.sources += 1;
            let deadline = Instant::now() + self.config.source_budget;

            let feed = match tokio::time::timeout_at(deadline, self.fetcher.fetch(source)).await {
                Ok(Ok(SourceFetch::Parsed(feed))) => feed,
                Ok(Ok(SourceFetch::Unchanged)) => {
                    report.unchanged_sources += 1;
                    continue;
                }
                Ok(Err(e)) => {
                    warn!("{}", e);
                    report.failed_sources += 1;
                    continue;
                }
                Err(_) => {
                    warn!("Source {} exceeded its {:?} budget while fetching", source.key, self.config.source_budget);
                    report.failed_sources += 1;
                    continue;
                }
            };

            let policy = DedupPolicy::for_feed(source.class);
            let mut admitted = Vec::new();

            for entry in feed.entries {
                report.processed += 1;

                let candidate = match normalizer.normalize_feed_entry(source, entry) {
                    Ok(Normalized::Candidate(candidate)) => candidate,
                    Ok(Normalized::Stale { title, published }) => {
                        debug!("Skipping stale entry '{}' published {}", title, published);
                        report.stale += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!("{}", e);
                        report.failed_entries += 1;
                        continue;
                    }
                };

                if candidate.published_inferred {
                    debug!("'{}' has no publish time, using {}", candidate.title, candidate.published);
                }

                match dedup.admit(policy.key_for(&candidate)).await {
                    Ok(true) => admitted.push(candidate),
                    Ok(false) => report.duplicates += 1,
                    Err(e) => {
                        warn!("Existence check failed for '{}': {}", candidate.title, e);
                        report.failed_entries += 1;
                    }
                }
            }

            info!("Source {}: {} new candidates", source.key, admitted.len());

            self.drain(admitted, Enrichment::Feed(source.content), &mut writer, &mut report, deadline)
                .await;
        }

        self.finish_stage(stage, writer, report).await
    }

    async fn run_api_stage(&self, now: DateTime<Utc>, dedup: &mut Deduplicator) -> StageReport {
        let stage = SweepStage::ExternalApi;
        let mut report = StageReport::default();

        let api = match &self.api {
            ApiStage::Ready(api) => api.clone(),
            ApiStage::Unavailable(reason) => {
                warn!("Stage {} skipped: configuration error: {}", stage.as_str(), reason);
                report.skipped = true;
                return report;
            }
        };

        report.sources = 1;
        let mut writer = BatchWriter::new(self.store.clone(), self.config.batch_sizes.api);
        let normalizer = EntryNormalizer::new(now, self.config.recency_horizon());
        let window = TimeWindow::ending_at(now, self.config.api_window_length());
        let deadline = Instant::now() + self.config.source_budget;

        let items = match tokio::time::timeout_at(deadline, api.fetch_news(&window, self.config.api_limit)).await {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                warn!("News API {} failed: {}", api.name(), e);
                report.failed_sources += 1;
                return report;
            }
            Err(_) => {
                warn!("News API {} exceeded its {:?} budget", api.name(), self.config.source_budget);
                report.failed_sources += 1;
                return report;
            }
        };

        info!("News API {} returned {} items", api.name(), items.len());

        let mut admitted = Vec::new();
        for item in items {
            report.processed += 1;

            let candidate = match normalizer.normalize_api_item(&self.config.api_category, item) {
                Ok(candidate) => candidate,
                Err(e) => {
                    warn!("{}", e);
                    report.failed_entries += 1;
                    continue;
                }
            };

            match dedup.admit(DedupPolicy::Url.key_for(&candidate)).await {
                Ok(true) => admitted.push(candidate),
                Ok(false) => report.duplicates += 1,
                Err(e) => {
                    warn!("Existence check failed for '{}': {}", candidate.title, e);
                    report.failed_entries += 1;
                }
            }
        }

        self.drain(admitted, Enrichment::Api, &mut writer, &mut report, deadline)
            .await;

        self.finish_stage(stage, writer, report).await
    }

    // Enriches admitted candidates on a bounded pool and hands them to the
    // writer in arrival order, until the source's deadline passes.
    async fn drain(
        &self,
        candidates: Vec<CandidateEntry>,
        mode: Enrichment,
        writer: &mut BatchWriter,
        report: &mut StageReport,
        deadline: Instant,
    ) {
        let total = candidates.len();
        let mut handled = 0usize;
        let workers = self.config.extraction.workers.max(1);

        let mut enriched = stream::iter(candidates)
            .map(|candidate| self.enrich(candidate, mode))
            .buffered(workers);

        loop {
            let next = match tokio::time::timeout_at(deadline, enriched.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(
                        "Source budget exhausted, {} candidates left unprocessed",
                        total - handled
                    );
                    report.failed_entries += total - handled;
                    break;
                }
            };

            let Some(candidate) = next else {
                break;
            };
            handled += 1;

            debug!("Accepted '{}' with tags {:?}", candidate.title, candidate.tags);
            if let Err(e) = writer.accept(candidate.into_new_article()).await {
                error!("{}; continuing with next candidate", e);
            }
        }
    }

    async fn enrich(&self, mut candidate: CandidateEntry, mode: Enrichment) -> CandidateEntry {
        let fallback_chars = self.config.summary_fallback_chars;

        match mode {
            Enrichment::Feed(policy) => {
                if policy == ContentPolicy::ClassifyByLink {
                    candidate.extracted_text = self.resolver.resolve(&candidate.link).await;
                }

                let body = if candidate.extracted_text.is_empty() {
                    candidate.fallback_text().to_string()
                } else {
                    candidate.extracted_text.clone()
                };

                candidate.summary = summarize_with_fallback(self.summarizer.as_ref(), &body, fallback_chars).await;
                candidate.tags = detect_tags(&body);
            }
            Enrichment::Api => {
                let item_summary = candidate.source_text.clone().unwrap_or_default();

                candidate.summary = if item_summary.chars().count() > self.config.api_summarize_threshold {
                    summarize_with_fallback(self.summarizer.as_ref(), &item_summary, fallback_chars).await
                } else {
                    candidate.fallback_text().to_string()
                };
                candidate.tags = detect_tags(&format!("{} {}", item_summary, candidate.title));
            }
        }

        candidate
    }

    async fn finish_stage(&self, stage: SweepStage, mut writer: BatchWriter, mut report: StageReport) -> StageReport {
        if let Err(e) = writer.flush().await {
            error!("Final batch of stage {} failed: {}", stage.as_str(), e);
        }

        let stats = writer.stats();
        report.added += stats.added;
        report.committed_batches += stats.committed_batches;
        report.failed_batches += stats.failed_batches;
        report.dropped += stats.dropped;

        info!(
            "Stage {} finished: processed {}, added {}, unchanged sources {}, failed sources {}",
            stage.as_str(),
            report.processed,
            report.added,
            report.unchanged_sources,
            report.failed_sources
        );
        report
    }
}
