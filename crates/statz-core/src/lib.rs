//! statz-core — data model and schema walk for the statz bridge.
//!
//! A `Snapshot` is a self-describing, ordered collection of named
//! measurement views fetched from the telemetry source. The view set is
//! open-ended: views this crate has never heard of decode into the
//! `Unknown` aggregation case instead of failing the snapshot.
//!
//! # Architecture
//!
//! ```text
//! Snapshot (wire JSON)
//!   └── walk() → Vec<ViewRecord>
//!         ├── Distribution — validated histogram, exportable
//!         ├── Interval     — scalar gauge, exportable
//!         └── Unknown      — shown on the debug page, never exported
//! ```

pub mod error;
pub mod types;
pub mod walker;

pub use error::{BridgeError, BridgeResult};
pub use types::{
    Aggregation, DistributionReduction, ExternalId, MetricDescriptor, MetricKind, PointValue,
    Snapshot, TimeSeriesPoint, ValueType, View, ViewName, ViewRecord, ViewShape,
};
pub use walker::walk;
