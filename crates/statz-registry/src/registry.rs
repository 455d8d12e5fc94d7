//! Create-once descriptor registry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use statz_client::{CreateOutcome, MetricsBackend};
use statz_core::{
    DistributionReduction, ExternalId, MetricDescriptor, MetricKind, ValueType, ViewName,
    ViewRecord, ViewShape,
};

/// A successfully registered descriptor, as the exporter needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorHandle {
    /// Backend identity points must reference.
    pub external_id: ExternalId,
    pub kind: MetricKind,
    /// Value type the descriptor was registered with; pushed points
    /// must match it.
    pub value_type: ValueType,
}

/// Result of resolving a view against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The view has a registered descriptor.
    Resolved(DescriptorHandle),
    /// Registration failed transiently; retry next cycle.
    Pending,
    /// The view's shape is unknown and is never registered.
    Skipped,
}

/// Maps view name → registered descriptor, creating each at most once.
///
/// Entries are append-only and live for the process lifetime. There is
/// no persisted state: after a restart the backend's "already exists"
/// replies rebuild the same identities.
pub struct DescriptorRegistry {
    backend: Arc<dyn MetricsBackend>,
    reduction: DistributionReduction,
    /// Identity prefix, e.g. `custom.statz.io/`.
    prefix: String,
    /// view name → handle. Write-once per key; a benign double-create
    /// race converges because both writers obtain the same identity.
    entries: Arc<RwLock<HashMap<ViewName, DescriptorHandle>>>,
}

impl DescriptorRegistry {
    pub fn new(
        backend: Arc<dyn MetricsBackend>,
        reduction: DistributionReduction,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            reduction,
            prefix: prefix.into(),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolve a view to its descriptor handle, registering on first
    /// encounter.
    ///
    /// Idempotent: any number of calls for the same view name,
    /// sequential or concurrent, converge on one external identity. A
    /// cached name never causes a backend call; a failed creation is
    /// never cached.
    pub async fn resolve(&self, record: &ViewRecord) -> Resolution {
        {
            let entries = self.entries.read().await;
            if let Some(handle) = entries.get(&record.name) {
                return Resolution::Resolved(handle.clone());
            }
        }

        let Some(descriptor) = self.build_descriptor(record) else {
            debug!(view = %record.name, "unknown shape, never registered");
            return Resolution::Skipped;
        };

        match self.backend.create_descriptor(&descriptor).await {
            Ok(outcome) => {
                let handle = DescriptorHandle {
                    external_id: outcome.external_id().clone(),
                    kind: descriptor.kind,
                    value_type: descriptor.value_type,
                };
                if let CreateOutcome::AlreadyExists(_) = outcome {
                    debug!(view = %record.name, id = %handle.external_id, "adopted existing descriptor");
                } else {
                    info!(view = %record.name, id = %handle.external_id, "descriptor registered");
                }

                let mut entries = self.entries.write().await;
                let stored = entries
                    .entry(record.name.clone())
                    .or_insert_with(|| handle.clone());
                Resolution::Resolved(stored.clone())
            }
            Err(e) => {
                warn!(view = %record.name, error = %e, "descriptor creation failed, will retry next cycle");
                Resolution::Pending
            }
        }
    }

    /// Build the descriptor for an exportable view, or `None` for an
    /// unknown shape.
    fn build_descriptor(&self, record: &ViewRecord) -> Option<MetricDescriptor> {
        let (kind, value_type) = match &record.shape {
            ViewShape::Distribution { .. } => (MetricKind::Cumulative, self.reduction.value_type()),
            ViewShape::Interval { .. } => (MetricKind::Gauge, ValueType::Double),
            ViewShape::Unknown(_) => return None,
        };

        Some(MetricDescriptor {
            view_name: record.name.clone(),
            external_id: format!("{}{}", self.prefix, record.name),
            kind,
            value_type,
            unit: "1".to_string(),
            display_name: record.name.clone(),
            description: record.description.clone(),
        })
    }

    /// Number of registered descriptors.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Whether a view name already has a handle.
    pub async fn contains(&self, name: &str) -> bool {
        self.entries.read().await.contains_key(name)
    }
}
