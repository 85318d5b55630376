//! Error types for the I/O side.

use pairchat_core::LinkId;
use thiserror::Error;

/// Errors reported by a [`Rendezvous`](crate::Rendezvous).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RendezvousError {
    /// The service could not be reached or refused the request.
    #[error("rendezvous unavailable: {reason}")]
    Unavailable {
        /// Service-provided description.
        reason: String,
    },

    /// Operation needs an endpoint and none is acquired.
    #[error("no endpoint acquired")]
    NoEndpoint,

    /// An endpoint is already acquired; release it first.
    #[error("endpoint already acquired")]
    EndpointInUse,

    /// The link is not known or is owned by another endpoint.
    #[error("unknown link: {0}")]
    UnknownLink(LinkId),
}

impl RendezvousError {
    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// Nothing in the runtime retries; the flag is informational.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Errors that stop the [`Runtime`](crate::Runtime).
///
/// Session-level failures never end up here: they are surfaced to the
/// presentation as notifications and the loop continues.
#[derive(Error, Debug)]
pub enum RuntimeError<D: std::error::Error + 'static> {
    /// The presentation driver failed.
    #[error("driver error: {0}")]
    Driver(#[source] D),

    /// The rendezvous failed outside any session operation.
    #[error("rendezvous error: {0}")]
    Rendezvous(#[from] RendezvousError),
}
