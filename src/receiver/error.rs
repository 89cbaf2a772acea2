//! Receiver outcome and error types.

use thiserror::Error;

use crate::crypto::KeyError;

/// Boxed error returned by message handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A request that failed authentication or could not be read.
///
/// Deliberately carries no detail: a bad signature and a well-signed but
/// undecryptable body look the same to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid signature")]
pub struct RejectedRequest;

/// Failures that escape `handle_request`.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// AES key missing or malformed for an encrypted request.
    #[error("receiver misconfigured: {0}")]
    Key(#[from] KeyError),

    /// The business handler failed.
    #[error("message handler failed: {0}")]
    Handler(#[source] BoxError),
}

impl ReceiverError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ReceiverError::Key(_) => "key",
            ReceiverError::Handler(_) => "handler",
        }
    }
}
