//! Export scheduler — drives fetch → walk → resolve → push cycles.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use statz_client::SnapshotSource;
use statz_core::walk;
use statz_registry::DescriptorRegistry;

use crate::exporter::{CycleReport, SeriesExporter};

/// Result of one scheduled cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran; see the report for what it exported.
    Completed(CycleReport),
    /// Snapshot fetch failed: the cycle was a no-op, with no descriptor
    /// or series calls made.
    SourceUnavailable,
}

/// Runs export cycles at a fixed period, or exactly once.
///
/// Single-flight: a cycle runs inline in the loop, so a new cycle never
/// starts while the previous one's backend calls are outstanding. A
/// cycle overrunning its period makes the loop skip the missed tick
/// rather than queue it.
pub struct ExportScheduler {
    source: Arc<dyn SnapshotSource>,
    registry: Arc<DescriptorRegistry>,
    exporter: SeriesExporter,
    period: Duration,
}

impl ExportScheduler {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        registry: Arc<DescriptorRegistry>,
        exporter: SeriesExporter,
        period: Duration,
    ) -> Self {
        Self {
            source,
            registry,
            exporter,
            period,
        }
    }

    /// Run one fetch → walk → resolve → push cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let snapshot = match self.source.get_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "snapshot fetch failed, skipping export cycle");
                return CycleOutcome::SourceUnavailable;
            }
        };

        let records = walk(&snapshot);
        let report = self
            .exporter
            .export_cycle(&records, &self.registry, SystemTime::now())
            .await;

        info!(
            views = records.len(),
            exported = report.exported,
            rejected = report.rejected,
            pending = report.pending,
            skipped = report.skipped,
            abandoned = report.abandoned,
            "export cycle finished"
        );
        CycleOutcome::Completed(report)
    }

    /// Run the periodic loop until the shutdown signal flips.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(period_secs = self.period.as_secs(), "export scheduler started");

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.changed() => {
                    info!("export scheduler shutting down");
                    break;
                }
            }
        }
    }
}
