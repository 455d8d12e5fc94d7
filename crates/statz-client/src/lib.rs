//! statz-client — seams to the two external collaborators.
//!
//! The bridge talks to a snapshot source (`GetSnapshot`) and a metrics
//! backend (`CreateDescriptor` / `PushTimeSeries`). Both are modeled as
//! object-safe traits so the registry, exporter, and debug page can be
//! driven by mocks in tests; the shipped implementations speak JSON over
//! HTTP with a per-request connection and a hard deadline.
//!
//! Transport security and credential setup are out of scope: addresses
//! arrive already resolved.

pub mod backend;
pub mod error;
mod http_io;
pub mod source;

use std::future::Future;
use std::pin::Pin;

pub use backend::{CreateOutcome, HttpMetricsBackend, MetricsBackend, PushOutcome, PushRejection};
pub use error::{ClientError, ClientResult};
pub use source::{HttpSnapshotSource, SnapshotSource};

/// Boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
