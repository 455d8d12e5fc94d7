//! Snapshot source seam.

use std::time::Duration;

use statz_core::Snapshot;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::{http_io, BoxFuture};

/// The telemetry source collaborator.
///
/// `get_snapshot` has no side effects on the source; the bridge fetches
/// a fresh snapshot per debug request and per export cycle.
pub trait SnapshotSource: Send + Sync {
    fn get_snapshot(&self) -> BoxFuture<'_, ClientResult<Snapshot>>;
}

/// Fetches snapshots as JSON over HTTP from the source's stats endpoint.
pub struct HttpSnapshotSource {
    address: String,
    path: String,
    timeout: Duration,
}

impl HttpSnapshotSource {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            path: "/snapshot".to_string(),
            timeout,
        }
    }

    /// Override the snapshot path (default `/snapshot`).
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn get_snapshot(&self) -> BoxFuture<'_, ClientResult<Snapshot>> {
        Box::pin(async move {
            debug!(address = %self.address, "fetching snapshot");
            let resp =
                http_io::request("GET", &self.address, &self.path, None, self.timeout).await?;

            if resp.status != 200 {
                return Err(ClientError::Status {
                    uri: format!("http://{}{}", self.address, self.path),
                    status: resp.status,
                });
            }

            serde_json::from_slice(&resp.body).map_err(|e| ClientError::Decode {
                uri: format!("http://{}{}", self.address, self.path),
                reason: e.to_string(),
            })
        })
    }
}
