//! Error types for the session core.
//!
//! Every error is terminal for the operation that raised it. Nothing in the
//! core retries; errors are surfaced once through
//! [`Notification::ErrorRaised`](crate::Notification::ErrorRaised) and leave
//! the session state consistent.

use pairchat_proto::{ProtocolError, RoomCode};
use thiserror::Error;

/// Coarse error category shown to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed room code input.
    InvalidCode,
    /// No room registered under the code.
    RoomNotFound,
    /// Endpoint acquisition failed.
    RendezvousUnavailable,
    /// Link-level failure.
    ConnectionError,
    /// Send attempted without an open link.
    NotConnected,
}

/// Errors raised by the session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Room code input does not match `^[A-Z0-9]{6}$`.
    #[error("please enter a valid 6-character room code (got {input:?})")]
    InvalidCode {
        /// Input as received, before any normalization.
        input: String,
    },

    /// Room code is well formed but nothing is registered under it.
    #[error("room {code} not found")]
    RoomNotFound {
        /// Code that missed.
        code: RoomCode,
    },

    /// The rendezvous service could not provide a local endpoint.
    #[error("rendezvous unavailable: {reason}")]
    RendezvousUnavailable {
        /// Underlying failure.
        reason: String,
    },

    /// The link failed or a frame could not be produced.
    #[error("connection error: {reason}")]
    ConnectionError {
        /// Underlying failure.
        reason: String,
    },

    /// No open link to send on.
    #[error("not connected to a peer")]
    NotConnected,
}

impl SessionError {
    /// Category for presentation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCode { .. } => ErrorKind::InvalidCode,
            Self::RoomNotFound { .. } => ErrorKind::RoomNotFound,
            Self::RendezvousUnavailable { .. } => ErrorKind::RendezvousUnavailable,
            Self::ConnectionError { .. } => ErrorKind::ConnectionError,
            Self::NotConnected => ErrorKind::NotConnected,
        }
    }

    /// Returns true if repeating the user action may succeed.
    ///
    /// Infrastructure failures are transient. Bad input and missing rooms are
    /// not: repeating the same join will fail the same way. The core never
    /// retries on its own; this only informs the presentation.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RendezvousUnavailable { .. } | Self::ConnectionError { .. })
    }
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidRoomCode { input } => Self::InvalidCode { input },
            other => Self::ConnectionError { reason: other.to_string() },
        }
    }
}
