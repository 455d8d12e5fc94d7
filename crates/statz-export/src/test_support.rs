//! Scripted collaborators shared by exporter and scheduler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use statz_client::{
    BoxFuture, ClientError, ClientResult, CreateOutcome, MetricsBackend, PushOutcome,
    PushRejection, SnapshotSource,
};
use statz_core::{
    Aggregation, MetricDescriptor, Snapshot, TimeSeriesPoint, View, ViewRecord, ViewShape,
};

pub fn interval_record(name: &str, value: f64) -> ViewRecord {
    ViewRecord {
        name: name.to_string(),
        description: format!("{name} description"),
        shape: ViewShape::Interval { value },
    }
}

pub fn distribution_record(name: &str) -> ViewRecord {
    ViewRecord {
        name: name.to_string(),
        description: format!("{name} description"),
        shape: ViewShape::Distribution {
            bucket_bounds: vec![0.0, 10.0, 100.0],
            bucket_counts: vec![1, 2, 3],
            sum: 150.0,
            count: 6,
        },
    }
}

pub fn two_view_snapshot() -> Snapshot {
    Snapshot {
        views: vec![
            View {
                name: "rpc.latency".to_string(),
                description: "rpc latency distribution".to_string(),
                aggregation: Aggregation::Distribution {
                    bucket_bounds: vec![0.0, 10.0, 100.0],
                    bucket_counts: vec![1, 2, 3],
                    sum: 150.0,
                    count: 6,
                },
            },
            View {
                name: "rpc.count".to_string(),
                description: "completed rpcs".to_string(),
                aggregation: Aggregation::Interval { value: 42.0 },
            },
        ],
    }
}

/// Backend double that records every call and can be scripted to fail
/// creates, fail pushes, or reject individual series once.
pub struct RecordingBackend {
    create_calls: AtomicUsize,
    push_attempts: AtomicUsize,
    fail_creates: Mutex<usize>,
    fail_pushes: Mutex<usize>,
    reject_once: Mutex<Vec<PushRejection>>,
    batches: Mutex<Vec<Vec<TimeSeriesPoint>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            create_calls: AtomicUsize::new(0),
            push_attempts: AtomicUsize::new(0),
            fail_creates: Mutex::new(0),
            fail_pushes: Mutex::new(0),
            reject_once: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next `n` create calls.
    pub fn fail_creates(&self, n: usize) {
        *self.fail_creates.lock().unwrap() = n;
    }

    /// Fail the next `n` push requests outright.
    pub fn fail_pushes(&self, n: usize) {
        *self.fail_pushes.lock().unwrap() = n;
    }

    /// Reject one series (by descriptor ref) on the next push it
    /// appears in, then accept it.
    pub fn reject_once(&self, descriptor_ref: &str, reason: &str) {
        self.reject_once.lock().unwrap().push(PushRejection {
            descriptor_ref: descriptor_ref.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn push_attempts(&self) -> usize {
        self.push_attempts.load(Ordering::SeqCst)
    }

    /// Successfully pushed batches, in order.
    pub fn pushed(&self) -> Vec<Vec<TimeSeriesPoint>> {
        self.batches.lock().unwrap().clone()
    }
}

impl MetricsBackend for RecordingBackend {
    fn create_descriptor<'a>(
        &'a self,
        descriptor: &'a MetricDescriptor,
    ) -> BoxFuture<'a, ClientResult<CreateOutcome>> {
        Box::pin(async move {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            {
                let mut remaining = self.fail_creates.lock().unwrap();
                if *remaining > 0 {
                    *remaining = remaining.saturating_sub(1);
                    return Err(ClientError::Connect {
                        addr: "backend:443".to_string(),
                        reason: "connection refused".to_string(),
                    });
                }
            }
            Ok(CreateOutcome::Created(descriptor.external_id.clone()))
        })
    }

    fn push_time_series<'a>(
        &'a self,
        batch: &'a [TimeSeriesPoint],
    ) -> BoxFuture<'a, ClientResult<PushOutcome>> {
        Box::pin(async move {
            self.push_attempts.fetch_add(1, Ordering::SeqCst);
            {
                let mut remaining = self.fail_pushes.lock().unwrap();
                if *remaining > 0 {
                    *remaining = remaining.saturating_sub(1);
                    return Err(ClientError::Deadline {
                        uri: "http://backend:443/v3/time_series".to_string(),
                        millis: 1000,
                    });
                }
            }

            let rejected: Vec<PushRejection> = {
                let mut pending = self.reject_once.lock().unwrap();
                let (hit, keep): (Vec<_>, Vec<_>) = pending
                    .drain(..)
                    .partition(|r| batch.iter().any(|p| p.descriptor_ref == r.descriptor_ref));
                *pending = keep;
                hit
            };

            let accepted = batch
                .iter()
                .map(|p| p.descriptor_ref.clone())
                .filter(|r| !rejected.iter().any(|rej| &rej.descriptor_ref == r))
                .collect();

            self.batches.lock().unwrap().push(
                batch
                    .iter()
                    .filter(|p| !rejected.iter().any(|r| r.descriptor_ref == p.descriptor_ref))
                    .cloned()
                    .collect(),
            );

            Ok(PushOutcome { accepted, rejected })
        })
    }
}

/// Snapshot source double: serves a fixed snapshot or fails.
pub struct ScriptedSource {
    snapshot: Mutex<Option<Snapshot>>,
    pub fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn serving(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            snapshot: Mutex::new(None),
            fetches: AtomicUsize::new(0),
        }
    }
}

impl SnapshotSource for ScriptedSource {
    fn get_snapshot(&self) -> BoxFuture<'_, ClientResult<Snapshot>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.snapshot.lock().unwrap().clone() {
                Some(snapshot) => Ok(snapshot),
                None => Err(ClientError::Connect {
                    addr: "127.0.0.1:8080".to_string(),
                    reason: "connection refused".to_string(),
                }),
            }
        })
    }
}
