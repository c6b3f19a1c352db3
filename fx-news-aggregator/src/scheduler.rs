use crate::collector::NewsCollector;
use crate::types::SweepReport;
use crate::utils::time::format_duration;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Runs sweeps on a fixed interval, starting immediately.
///
/// A sweep that overruns the interval delays the next one instead of
/// triggering a burst of catch-up sweeps.
pub struct SweepScheduler {
    interval: Duration,
}

impl SweepScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Sweep until `shutdown` resolves. Returns the number of completed sweeps.
    pub async fn run_until<F>(&self, collector: &NewsCollector, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!("Scheduling news sweeps every {}", format_duration(self.interval));

        let mut completed = 0usize;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested after {} sweeps", completed);
                    break;
                }
                _ = ticker.tick() => {
                    let report: SweepReport = collector.run_sweep().await;
                    completed += 1;
                    info!(
                        "Sweep {} done: processed {}, added {}",
                        report.sweep_id,
                        report.processed(),
                        report.added()
                    );
                }
            }
        }
        completed
    }
}
