//! Metrics backend seam.
//!
//! The backend requires a descriptor to be registered before it accepts
//! points for it. Registration reports "already exists" as a distinct
//! outcome carrying the existing identity, which the registry adopts so
//! a restarted bridge converges on the same descriptors.

use std::time::Duration;

use serde::Deserialize;
use statz_core::{ExternalId, MetricDescriptor, TimeSeriesPoint};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::{http_io, BoxFuture};

/// Outcome of a descriptor creation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The backend created the descriptor and assigned this identity.
    Created(ExternalId),
    /// A descriptor with this name already existed under this identity.
    AlreadyExists(ExternalId),
}

impl CreateOutcome {
    pub fn external_id(&self) -> &ExternalId {
        match self {
            CreateOutcome::Created(id) | CreateOutcome::AlreadyExists(id) => id,
        }
    }
}

/// One rejected series from a partially failed push.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PushRejection {
    pub descriptor_ref: ExternalId,
    pub reason: String,
}

/// Outcome of a series push. A non-empty `rejected` list with some
/// accepted series is a partial failure, not a request failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOutcome {
    pub accepted: Vec<ExternalId>,
    pub rejected: Vec<PushRejection>,
}

/// The metrics backend collaborator.
pub trait MetricsBackend: Send + Sync {
    fn create_descriptor<'a>(
        &'a self,
        descriptor: &'a MetricDescriptor,
    ) -> BoxFuture<'a, ClientResult<CreateOutcome>>;

    fn push_time_series<'a>(
        &'a self,
        batch: &'a [TimeSeriesPoint],
    ) -> BoxFuture<'a, ClientResult<PushOutcome>>;
}

#[derive(Deserialize)]
struct DescriptorReply {
    external_id: ExternalId,
}

#[derive(Deserialize, Default)]
struct PushReply {
    #[serde(default)]
    rejected: Vec<PushRejection>,
}

/// Talks JSON over HTTP to the backend's metric service.
pub struct HttpMetricsBackend {
    address: String,
    timeout: Duration,
}

impl HttpMetricsBackend {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    fn uri(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }
}

impl MetricsBackend for HttpMetricsBackend {
    fn create_descriptor<'a>(
        &'a self,
        descriptor: &'a MetricDescriptor,
    ) -> BoxFuture<'a, ClientResult<CreateOutcome>> {
        Box::pin(async move {
            let path = "/v3/metric_descriptors";
            let body = serde_json::to_vec(descriptor).map_err(|e| ClientError::Request {
                uri: self.uri(path),
                reason: e.to_string(),
            })?;

            let resp =
                http_io::request("POST", &self.address, path, Some(body), self.timeout).await?;

            match resp.status {
                200 | 201 => {
                    let reply: DescriptorReply =
                        serde_json::from_slice(&resp.body).map_err(|e| ClientError::Decode {
                            uri: self.uri(path),
                            reason: e.to_string(),
                        })?;
                    debug!(view = %descriptor.view_name, id = %reply.external_id, "descriptor created");
                    Ok(CreateOutcome::Created(reply.external_id))
                }
                // Conflict: adopt the identity the backend reports. If the
                // conflict body is unparseable, the requested identity is
                // authoritative anyway (names map 1:1 to identities).
                409 => {
                    let id = serde_json::from_slice::<DescriptorReply>(&resp.body)
                        .map(|r| r.external_id)
                        .unwrap_or_else(|_| descriptor.external_id.clone());
                    debug!(view = %descriptor.view_name, %id, "descriptor already existed");
                    Ok(CreateOutcome::AlreadyExists(id))
                }
                status => Err(ClientError::Status {
                    uri: self.uri(path),
                    status,
                }),
            }
        })
    }

    fn push_time_series<'a>(
        &'a self,
        batch: &'a [TimeSeriesPoint],
    ) -> BoxFuture<'a, ClientResult<PushOutcome>> {
        Box::pin(async move {
            let path = "/v3/time_series";
            let body = serde_json::to_vec(&serde_json::json!({ "points": batch })).map_err(|e| {
                ClientError::Request {
                    uri: self.uri(path),
                    reason: e.to_string(),
                }
            })?;

            let resp =
                http_io::request("POST", &self.address, path, Some(body), self.timeout).await?;

            if resp.status != 200 {
                return Err(ClientError::Status {
                    uri: self.uri(path),
                    status: resp.status,
                });
            }

            let reply: PushReply =
                serde_json::from_slice(&resp.body).unwrap_or_default();
            let rejected_refs: Vec<&ExternalId> =
                reply.rejected.iter().map(|r| &r.descriptor_ref).collect();
            let accepted = batch
                .iter()
                .map(|p| p.descriptor_ref.clone())
                .filter(|r| !rejected_refs.contains(&r))
                .collect();

            Ok(PushOutcome {
                accepted,
                rejected: reply.rejected,
            })
        })
    }
}
