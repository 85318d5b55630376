//! Link and endpoint types shared with the rendezvous layer.

use std::fmt;

/// Opaque address of a session's rendezvous endpoint.
///
/// Assigned by the rendezvous service when a session acquires an endpoint;
/// never reused across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointAddress(String);

impl EndpointAddress {
    /// Wrap an address handed out by the rendezvous service.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one link, assigned by the rendezvous layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// Options for opening an outbound link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    /// Ask the transport for reliable, ordered delivery.
    pub reliable: bool,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self { reliable: true }
    }
}

/// Lifecycle of a link.
///
/// ```text
/// Connecting ──open──> Open ──close──> Closed
///      │                 │
///      └──error──> Errored <──error──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Created, not yet usable.
    Connecting,
    /// Frames can flow.
    Open,
    /// Closed by either side.
    Closed,
    /// Failed.
    Errored,
}

/// Event emitted by a link, in transport order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Link became usable.
    Open,
    /// One frame arrived.
    Data(Vec<u8>),
    /// Link closed (by either side).
    Close,
    /// Link failed.
    Error {
        /// Transport-provided description.
        reason: String,
    },
}

impl LinkEvent {
    /// State the link is in after this event.
    pub fn resulting_state(&self) -> LinkState {
        match self {
            Self::Open | Self::Data(_) => LinkState::Open,
            Self::Close => LinkState::Closed,
            Self::Error { .. } => LinkState::Errored,
        }
    }
}
