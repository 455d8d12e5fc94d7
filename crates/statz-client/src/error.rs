//! Client error types.

use thiserror::Error;

/// Result type alias for collaborator calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors from a single outbound call to a collaborator.
///
/// All of these are transient from the bridge's point of view: the
/// caller logs, degrades, and lets the next cycle or request retry.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    #[error("request to {uri} failed: {reason}")]
    Request { uri: String, reason: String },

    #[error("call to {uri} exceeded its {millis}ms deadline")]
    Deadline { uri: String, millis: u64 },

    #[error("unexpected status {status} from {uri}")]
    Status { uri: String, status: u16 },

    #[error("failed to decode response from {uri}: {reason}")]
    Decode { uri: String, reason: String },
}
