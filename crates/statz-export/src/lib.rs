//! statz-export — turns walked views into backend time-series pushes.
//!
//! # Architecture
//!
//! ```text
//! ExportScheduler::run()            ← periodic, single-flight
//!   └── cycle: fetch → walk → per view:
//!         registry.resolve()        ← create-once descriptors
//!         SeriesExporter            ← interval cursor + reduction
//!       push batch (bounded retry)
//! ```
//!
//! A cycle degrades instead of failing: an unreachable source makes the
//! cycle a logged no-op, an unreachable backend abandons the cycle after
//! bounded backoff, and per-series rejections only hold back the
//! rejected series' interval cursors.

pub mod exporter;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use exporter::{CycleReport, ExportConfig, SeriesExporter, MIN_POINT_INTERVAL};
pub use scheduler::{CycleOutcome, ExportScheduler};
