//! Schema walk — classify each view of a snapshot into a validated shape.
//!
//! The walk only looks at the declared view fields (name, description,
//! aggregation). A malformed view degrades to `Unknown` and the walk
//! continues; one bad payload never fails the whole snapshot.

use tracing::debug;

use crate::types::{Aggregation, Snapshot, ViewRecord, ViewShape};

/// Walk a snapshot, yielding exactly one record per view in snapshot order.
pub fn walk(snapshot: &Snapshot) -> Vec<ViewRecord> {
    snapshot
        .views
        .iter()
        .map(|view| {
            let shape = classify(&view.aggregation);
            if let ViewShape::Unknown(_) = shape {
                debug!(view = %view.name, "aggregation did not match a known shape");
            }
            ViewRecord {
                name: view.name.clone(),
                description: view.description.clone(),
                shape,
            }
        })
        .collect()
}

/// Classify one aggregation payload, validating distribution structure.
fn classify(aggregation: &Aggregation) -> ViewShape {
    match aggregation {
        Aggregation::Distribution {
            bucket_bounds,
            bucket_counts,
            sum,
            count,
        } => {
            if valid_distribution(bucket_bounds, bucket_counts) {
                ViewShape::Distribution {
                    bucket_bounds: bucket_bounds.clone(),
                    bucket_counts: bucket_counts.clone(),
                    sum: *sum,
                    count: *count,
                }
            } else {
                // Structurally broken histogram: keep it visible, skip export.
                ViewShape::Unknown(
                    serde_json::to_value(aggregation).unwrap_or(serde_json::Value::Null),
                )
            }
        }
        Aggregation::Interval { value } => ViewShape::Interval { value: *value },
        Aggregation::Unknown(raw) => ViewShape::Unknown(raw.clone()),
    }
}

/// A distribution is well-formed when it has one count per bucket and
/// strictly increasing bounds.
fn valid_distribution(bounds: &[f64], counts: &[u64]) -> bool {
    if bounds.is_empty() || counts.len() != bounds.len() {
        return false;
    }
    bounds.windows(2).all(|w| w[0] < w[1])
}
