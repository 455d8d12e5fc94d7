//! Series exporter — interval bookkeeping, scalar reduction, batch push.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::sleep;
use tracing::{debug, error, warn};

use statz_client::MetricsBackend;
use statz_registry::{DescriptorRegistry, Resolution};
use statz_core::{PointValue, TimeSeriesPoint, ValueType, ViewName, ViewRecord, ViewShape};

/// Floor on a point's interval width. Guarantees `end > start` even
/// when cycles fire faster than clock resolution.
pub const MIN_POINT_INTERVAL: Duration = Duration::from_millis(1);

/// Tuning for one exporter.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Attempts per cycle when the whole push request fails.
    pub max_push_attempts: u32,
    /// First retry delay; doubles per attempt.
    pub initial_backoff: Duration,
    /// Backoff cap.
    pub max_backoff: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_push_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// What one export cycle did, for logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Series accepted by the backend.
    pub exported: usize,
    /// Series the backend rejected individually.
    pub rejected: usize,
    /// Views with no descriptor yet (registration pending).
    pub pending: usize,
    /// Unknown-shaped views, never exported.
    pub skipped: usize,
    /// The whole push failed and retries ran out.
    pub abandoned: bool,
}

/// Converts resolved views into time-series points and pushes one batch
/// per cycle.
///
/// Keeps a per-view interval cursor: the first export for a view starts
/// at `now`, later exports start where the last accepted interval
/// ended. A cursor only advances when the backend accepts the series,
/// so rejected or abandoned windows are re-covered next cycle.
pub struct SeriesExporter {
    backend: Arc<dyn MetricsBackend>,
    config: ExportConfig,
    /// view name → end of the last accepted interval.
    cursors: HashMap<ViewName, SystemTime>,
}

impl SeriesExporter {
    pub fn new(backend: Arc<dyn MetricsBackend>, config: ExportConfig) -> Self {
        Self {
            backend,
            config,
            cursors: HashMap::new(),
        }
    }

    /// Run one export pass over walked records at time `now`.
    ///
    /// Resolves each view through the registry, builds points for the
    /// resolved ones, and pushes them as a single batch with bounded
    /// retry. Pending and unknown views are counted and skipped.
    pub async fn export_cycle(
        &mut self,
        records: &[ViewRecord],
        registry: &DescriptorRegistry,
        now: SystemTime,
    ) -> CycleReport {
        let mut report = CycleReport::default();
        let mut batch: Vec<(ViewName, TimeSeriesPoint)> = Vec::new();

        for record in records {
            match registry.resolve(record).await {
                Resolution::Resolved(handle) => {
                    let Some(value) = reduce(&record.shape, handle.value_type) else {
                        // Shape/descriptor disagreement; treat like unknown.
                        report.skipped += 1;
                        continue;
                    };
                    let start = self.cursors.get(&record.name).copied().unwrap_or(now);
                    let end = (start + MIN_POINT_INTERVAL).max(now);
                    batch.push((
                        record.name.clone(),
                        TimeSeriesPoint {
                            descriptor_ref: handle.external_id,
                            interval_start: start,
                            interval_end: end,
                            value,
                        },
                    ));
                }
                Resolution::Pending => report.pending += 1,
                Resolution::Skipped => report.skipped += 1,
            }
        }

        if batch.is_empty() {
            debug!("no resolved views to export this cycle");
            return report;
        }

        let points: Vec<TimeSeriesPoint> = batch.iter().map(|(_, p)| p.clone()).collect();
        let mut backoff = self.config.initial_backoff;

        for attempt in 1..=self.config.max_push_attempts {
            match self.backend.push_time_series(&points).await {
                Ok(outcome) => {
                    let accepted: HashSet<&str> =
                        outcome.accepted.iter().map(String::as_str).collect();
                    for (name, point) in &batch {
                        if accepted.contains(point.descriptor_ref.as_str()) {
                            self.cursors.insert(name.clone(), point.interval_end);
                            report.exported += 1;
                        }
                    }
                    for rejection in &outcome.rejected {
                        warn!(
                            series = %rejection.descriptor_ref,
                            reason = %rejection.reason,
                            "series rejected, window retried next cycle"
                        );
                        report.rejected += 1;
                        // A rejected view must re-cover the same window next
                        // cycle. Views rejected on their very first export
                        // have no cursor yet; pin it to this window's start
                        // so the window is rebuilt instead of restarting at
                        // the next cycle's now.
                        if let Some((name, point)) = batch
                            .iter()
                            .find(|(_, p)| p.descriptor_ref == rejection.descriptor_ref)
                        {
                            self.cursors
                                .entry(name.clone())
                                .or_insert(point.interval_start);
                        }
                    }
                    return report;
                }
                Err(e) if attempt < self.config.max_push_attempts => {
                    warn!(
                        error = %e,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "series push failed, backing off"
                    );
                    sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.max_backoff);
                }
                Err(e) => {
                    error!(error = %e, attempts = attempt, "series push abandoned for this cycle");
                    report.abandoned = true;
                    return report;
                }
            }
        }

        report
    }
}

/// Reduce a view's shape to the scalar the descriptor declared.
///
/// Distributions were registered under a reduction policy, so the
/// handle's value type decides which scalar to carry: INT64 descriptors
/// get the sample count, DOUBLE descriptors get the sum. Intervals map
/// directly to their value.
fn reduce(shape: &ViewShape, value_type: ValueType) -> Option<PointValue> {
    match (shape, value_type) {
        (ViewShape::Distribution { count, .. }, ValueType::Int64) => {
            Some(PointValue::Int64(*count as i64))
        }
        (ViewShape::Distribution { sum, .. }, ValueType::Double) => {
            Some(PointValue::Double(*sum))
        }
        (ViewShape::Interval { value }, ValueType::Double) => Some(PointValue::Double(*value)),
        // Intervals are only ever registered as DOUBLE; any other pairing
        // means the shape and descriptor disagree, and the view is skipped.
        _ => None,
    }
}
