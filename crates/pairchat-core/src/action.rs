//! Session side-effects and notifications.
//!
//! [`SessionAction`]s are instructions for the runtime: rendezvous operations
//! to perform and [`Notification`]s to hand to the presentation layer.

use pairchat_proto::RoomCode;

use crate::{
    ChatMessage, ConnectionStatus, EndpointAddress, LinkId, LinkOptions, Screen, SessionError,
};

/// Actions produced by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Acquire a local endpoint. Answer with `EndpointAcquired` or
    /// `EndpointFailed`.
    AcquireEndpoint,

    /// Start accepting incoming links on the acquired endpoint. Each one is
    /// reported as `IncomingLink`.
    Listen,

    /// Open a link to a remote endpoint. Answer with `LinkStarted` or
    /// `LinkFailed`.
    OpenLink {
        /// Endpoint to connect to.
        remote: EndpointAddress,
        /// Transport options.
        options: LinkOptions,
    },

    /// Send one encoded frame on a link.
    Send {
        /// Link to send on.
        link: LinkId,
        /// JSON-encoded data frame.
        payload: Vec<u8>,
    },

    /// Close a link and release its resources.
    CloseLink {
        /// Link to close.
        link: LinkId,
    },

    /// Tear down the local endpoint and every link on it.
    ReleaseEndpoint,

    /// Tell the presentation layer something changed.
    Notify(Notification),
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Show a different screen.
    ScreenChanged(Screen),
    /// A message was appended to the chat log.
    MessageAppended(ChatMessage),
    /// Connection indicator changed.
    ConnectionStatusChanged(ConnectionStatus),
    /// An operation failed. Shown once, transiently.
    ErrorRaised(SessionError),
    /// Room code of the active session: the host's code to share, or the
    /// code a guest joined.
    RoomCodeReady(RoomCode),
    /// Local endpoint acquired.
    LocalEndpointReady(EndpointAddress),
}

impl SessionAction {
    /// The notification carried by this action, if any.
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Self::Notify(notification) => Some(notification),
            _ => None,
        }
    }

    /// The error carried by this action, if it raises one.
    pub fn error(&self) -> Option<&SessionError> {
        match self {
            Self::Notify(Notification::ErrorRaised(err)) => Some(err),
            _ => None,
        }
    }
}
