//! Session input events.
//!
//! Events originate from three sources:
//! - User intents forwarded by the presentation layer.
//! - Completions of rendezvous operations the controller asked for.
//! - Lifecycle events of links, in the order the transport emits them.

use crate::{EndpointAddress, LinkEvent, LinkId};

/// Events processed by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// User wants to host a new room.
    CreateRoom,

    /// User wants to join a room.
    JoinRoom {
        /// Code as entered. Must already be normalized (uppercased).
        code: String,
    },

    /// User wants to send a message.
    SendMessage {
        /// Text as typed; trimmed before sending.
        text: String,
    },

    /// User wants to leave the room.
    LeaveRoom,

    /// Local endpoint acquired.
    EndpointAcquired {
        /// Address other sessions can open links to.
        endpoint: EndpointAddress,
    },

    /// Endpoint acquisition or listening failed, or the rendezvous service
    /// dropped the endpoint later.
    EndpointFailed {
        /// Underlying failure.
        reason: String,
    },

    /// Outbound link created in `Connecting` state.
    LinkStarted {
        /// Link assigned by the rendezvous layer.
        link: LinkId,
    },

    /// Outbound link could not be created at all.
    LinkFailed {
        /// Underlying failure.
        reason: String,
    },

    /// Remote session opened a link to our endpoint.
    IncomingLink {
        /// Link assigned by the rendezvous layer.
        link: LinkId,
    },

    /// Lifecycle event of a link.
    Link {
        /// Link the event belongs to.
        link: LinkId,
        /// What happened.
        event: LinkEvent,
    },
}
