//! Domain types for the statz bridge.
//!
//! Snapshot/view types mirror the telemetry source's wire shape and are
//! deserialized from JSON; descriptor and point types mirror what the
//! metrics backend accepts.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// A view's name, unique within one snapshot.
pub type ViewName = String;

/// The backend-assigned identity of a registered metric descriptor.
pub type ExternalId = String;

// ── Snapshot ───────────────────────────────────────────────────────

/// One complete, point-in-time read of all views from the source.
///
/// Fetched fresh per operation (debug render or export cycle) and
/// discarded afterwards; never cached across requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Views in schema declaration order. Names are unique.
    pub views: Vec<View>,
}

/// A single named, described measurement within a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct View {
    pub name: ViewName,
    pub description: String,
    pub aggregation: Aggregation,
}

/// The statistical shape of a view's current value.
///
/// Untagged: the decoder tries each known shape in order and falls back
/// to `Unknown`, so a snapshot carrying a future aggregation kind still
/// decodes as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Aggregation {
    Distribution {
        /// Histogram bucket boundaries, strictly increasing.
        bucket_bounds: Vec<f64>,
        /// One count per bucket, same length as `bucket_bounds`.
        bucket_counts: Vec<u64>,
        /// Sum of all recorded values.
        sum: f64,
        /// Total number of recorded values.
        count: u64,
    },
    Interval {
        /// Current scalar value over the view's window.
        value: f64,
    },
    /// Forward-compatibility case: any payload not matching a known shape.
    Unknown(serde_json::Value),
}

// ── Walk output ────────────────────────────────────────────────────

/// Validated classification of a view's aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewShape {
    Distribution {
        bucket_bounds: Vec<f64>,
        bucket_counts: Vec<u64>,
        sum: f64,
        count: u64,
    },
    Interval {
        value: f64,
    },
    /// Unclassifiable payload, kept raw for the debug page.
    Unknown(serde_json::Value),
}

impl ViewShape {
    /// Whether this shape can be exported to the backend.
    pub fn exportable(&self) -> bool {
        !matches!(self, ViewShape::Unknown(_))
    }
}

/// One walked view: name, description, and validated shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRecord {
    pub name: ViewName,
    pub description: String,
    pub shape: ViewShape,
}

// ── Backend descriptor / points ────────────────────────────────────

/// How the backend accumulates points for a metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricKind {
    Cumulative,
    Gauge,
}

/// The value type the backend expects for a metric's points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Int64,
    Double,
}

/// Backend-side registration of a metric's metadata.
///
/// Created at most once per view name for the lifetime of the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricDescriptor {
    pub view_name: ViewName,
    /// Backend identity, e.g. `custom.statz.io/rpc.latency`.
    pub external_id: ExternalId,
    pub kind: MetricKind,
    pub value_type: ValueType,
    pub unit: String,
    pub display_name: String,
    pub description: String,
}

/// A scalar point value, typed to match its descriptor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PointValue {
    Int64(i64),
    Double(f64),
}

/// One time-series point pushed to the backend.
///
/// Invariant: `interval_end > interval_start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSeriesPoint {
    /// The descriptor this point belongs to.
    pub descriptor_ref: ExternalId,
    pub interval_start: SystemTime,
    pub interval_end: SystemTime,
    pub value: PointValue,
}

// ── Export policy ──────────────────────────────────────────────────

/// How a distribution aggregation is reduced to a single scalar point.
///
/// Backend support for distribution-typed values varies, so the
/// reduction is a configured policy rather than a fixed algorithm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistributionReduction {
    /// Export the total sample count (INT64, cumulative).
    #[default]
    Count,
    /// Export the sum of recorded values (DOUBLE, cumulative).
    Sum,
}

impl DistributionReduction {
    /// The value type a descriptor must declare under this policy.
    pub fn value_type(self) -> ValueType {
        match self {
            DistributionReduction::Count => ValueType::Int64,
            DistributionReduction::Sum => ValueType::Double,
        }
    }
}
