//! Shared error taxonomy for the statz bridge.

use thiserror::Error;

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while bridging a snapshot to its consumers.
///
/// Everything here except `ListenBind` is absorbed locally: logged,
/// surfaced in-band on the debug page, or retried on the next cycle.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Snapshot fetch failed or timed out.
    #[error("snapshot source unavailable: {0}")]
    SourceUnavailable(String),

    /// Descriptor creation or series push failed or timed out.
    #[error("metrics backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A view's aggregation payload matches no known shape.
    #[error("view {view} has an unrecognized aggregation payload")]
    SchemaMismatch { view: String },

    /// The debug HTTP listener could not bind its port. Fatal at startup.
    #[error("failed to bind debug listener on {addr}: {source}")]
    ListenBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
