//! Rendezvous contract.
//!
//! A rendezvous hands out endpoint addresses, opens links between endpoints
//! and reports what happens on them. The session never talks to it directly:
//! the [`Runtime`](crate::Runtime) executes the session's actions against it
//! and feeds its events back.

use std::future::Future;

use pairchat_core::{EndpointAddress, LinkEvent, LinkId, LinkOptions, SessionEvent};

use crate::RendezvousError;

/// Event reported by a rendezvous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendezvousEvent {
    /// A remote endpoint opened a link to ours. Delivered only after
    /// [`Rendezvous::listen`].
    IncomingLink {
        /// Local id of the new link.
        link: LinkId,
    },

    /// Something happened on a link. In transport order per link.
    Link {
        /// Link the event belongs to.
        link: LinkId,
        /// What happened.
        event: LinkEvent,
    },

    /// The service dropped our endpoint. Links already open keep working,
    /// but no new incoming links arrive.
    EndpointLost {
        /// Service-provided description.
        reason: String,
    },
}

impl From<RendezvousEvent> for SessionEvent {
    fn from(event: RendezvousEvent) -> Self {
        match event {
            RendezvousEvent::IncomingLink { link } => Self::IncomingLink { link },
            RendezvousEvent::Link { link, event } => Self::Link { link, event },
            RendezvousEvent::EndpointLost { reason } => Self::EndpointFailed { reason },
        }
    }
}

/// Client of a rendezvous service.
///
/// One endpoint at a time. Implementations must deliver link events in
/// transport order and must not deliver events for a link after
/// [`close_link`](Rendezvous::close_link) returns for it, except ones
/// already queued.
pub trait Rendezvous: Send {
    /// Acquire a locally-routable endpoint.
    ///
    /// # Errors
    ///
    /// [`RendezvousError::Unavailable`] on service or transport failure.
    fn acquire_endpoint(
        &mut self,
    ) -> impl Future<Output = Result<EndpointAddress, RendezvousError>> + Send;

    /// Start reporting incoming links on the acquired endpoint.
    fn listen(&mut self) -> impl Future<Output = Result<(), RendezvousError>> + Send;

    /// Open a link to `remote`.
    ///
    /// Returns as soon as the link exists, in the connecting state. Failure
    /// to reach the remote is reported later as [`LinkEvent::Error`].
    fn open_link(
        &mut self,
        remote: &EndpointAddress,
        options: LinkOptions,
    ) -> impl Future<Output = Result<LinkId, RendezvousError>> + Send;

    /// Send one frame on a link.
    fn send(
        &mut self,
        link: LinkId,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), RendezvousError>> + Send;

    /// Close a link. The remote end observes [`LinkEvent::Close`].
    fn close_link(&mut self, link: LinkId)
    -> impl Future<Output = Result<(), RendezvousError>> + Send;

    /// Tear down the endpoint and every link on it. No-op without one.
    fn release(&mut self) -> impl Future<Output = Result<(), RendezvousError>> + Send;

    /// Next event. `None` once the rendezvous is shut down for good.
    fn next_event(&mut self) -> impl Future<Output = Option<RendezvousEvent>> + Send;
}
