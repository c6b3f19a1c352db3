use crate::store::ArticleStore;
use crate::types::{AggregatorError, NewArticle, Result};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub committed_batches: usize,
    pub failed_batches: usize,
    /// Rows that were actually inserted.
    pub added: usize,
    /// Accepted articles lost to a rolled-back batch.
    pub dropped: usize,
}

/// Groups accepted articles into fixed-size transactional commits.
///
/// The pending batch lives in memory only; a transaction is opened when the
/// batch is committed and closed before `accept` returns.
pub struct BatchWriter {
    store: ArticleStore,
    batch_size: usize,
    pending: Vec<NewArticle>,
    stats: BatchStats,
}

impl BatchWriter {
    pub fn new(store: ArticleStore, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            stats: BatchStats::default(),
        }
    }

    /// Queue an article, committing once the batch is full.
    ///
    /// A failed commit returns `AggregatorError::Commit`; that batch is gone
    /// but the writer stays usable.
    pub async fn accept(&mut self, article: NewArticle) -> Result<()> {
        self.pending.push(article);
        if self.pending.len() >= self.batch_size {
            self.commit_pending().await?;
        }
        Ok(())
    }

    /// Commit whatever is pending.
    pub async fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.commit_pending().await.map(|_| ())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    async fn commit_pending(&mut self) -> Result<usize> {
        let batch = std::mem::take(&mut self.pending);

        match self.store.commit_batch(&batch).await {
            Ok(inserted) => {
                self.stats.committed_batches += 1;
                self.stats.added += inserted;
                info!("Batch commit: {} of {} articles saved", inserted, batch.len());
                Ok(inserted)
            }
            Err(e) => {
                self.stats.failed_batches += 1;
                self.stats.dropped += batch.len();
                Err(AggregatorError::Commit {
                    batch_len: batch.len(),
                    message: e.to_string(),
                })
            }
        }
    }
}
