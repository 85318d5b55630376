//! In-process rendezvous.
//!
//! [`LocalHub`] plays the rendezvous service for every session in one
//! process: it assigns endpoint addresses (`peer-1`, `peer-2`, ...), pairs
//! the two ends of each link and moves frames between them. Each session
//! talks to it through its own [`LocalRendezvous`], which receives events on
//! an unbounded tokio channel.
//!
//! Each end of a link has its own [`LinkId`]. Opening a link to a listening
//! endpoint reports `IncomingLink` then `Open` to the remote end and `Open`
//! to the opener; closing one end reports `Close` to the other.

#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use pairchat_core::{EndpointAddress, LinkEvent, LinkId, LinkOptions};
use tokio::sync::mpsc;

use crate::{Rendezvous, RendezvousError, RendezvousEvent};

#[derive(Debug)]
struct Endpoint {
    events: mpsc::UnboundedSender<RendezvousEvent>,
    listening: bool,
}

#[derive(Debug)]
struct LinkEnd {
    owner: EndpointAddress,
    /// Remote end. `None` once the remote closed.
    peer: Option<LinkId>,
}

#[derive(Debug, Default)]
struct HubState {
    available: bool,
    next_endpoint: u64,
    next_link: u64,
    endpoints: HashMap<EndpointAddress, Endpoint>,
    links: HashMap<LinkId, LinkEnd>,
}

impl HubState {
    fn deliver(&self, endpoint: &EndpointAddress, event: RendezvousEvent) {
        let Some(target) = self.endpoints.get(endpoint) else {
            tracing::debug!(%endpoint, "dropping event for released endpoint");
            return;
        };
        // A dropped receiver means the session is gone; nothing to tell.
        let _ = target.events.send(event);
    }

    fn deliver_link(&self, link: LinkId, event: LinkEvent) {
        if let Some(end) = self.links.get(&link) {
            self.deliver(&end.owner, RendezvousEvent::Link { link, event });
        }
    }

    fn allocate_link(&mut self) -> LinkId {
        self.next_link += 1;
        LinkId(self.next_link)
    }

    /// Remove `link` and tell its peer.
    fn close(&mut self, link: LinkId) {
        let Some(end) = self.links.remove(&link) else {
            return;
        };
        if let Some(peer) = end.peer {
            if let Some(peer_end) = self.links.get_mut(&peer) {
                peer_end.peer = None;
            }
            self.deliver_link(peer, LinkEvent::Close);
        }
    }
}

/// Shared in-process rendezvous service.
///
/// Cheap to clone; clones share the same service.
#[derive(Debug, Clone)]
pub struct LocalHub {
    state: Arc<Mutex<HubState>>,
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHub {
    /// Create a hub that accepts endpoint requests.
    pub fn new() -> Self {
        let state = HubState { available: true, ..HubState::default() };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Create a client of this hub.
    pub fn connect(&self) -> LocalRendezvous {
        let (tx, rx) = mpsc::unbounded_channel();
        LocalRendezvous { hub: self.clone(), endpoint: None, tx, rx }
    }

    /// Make endpoint acquisition fail (`false`) or succeed (`true`).
    ///
    /// Existing endpoints and links are unaffected.
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Drop `endpoint` from the service, as a signaling server losing a
    /// client would. Its owner sees `EndpointLost`; open links are kept.
    ///
    /// Returns false if no such endpoint is acquired.
    pub fn drop_endpoint(&self, endpoint: &EndpointAddress) -> bool {
        let mut hub = self.lock();
        let Some(entry) = hub.endpoints.get_mut(endpoint) else {
            return false;
        };
        entry.listening = false;
        hub.deliver(endpoint, RendezvousEvent::EndpointLost {
            reason: format!("endpoint {endpoint} dropped by hub"),
        });

        tracing::debug!(%endpoint, "endpoint dropped");
        true
    }

    /// Number of endpoints currently acquired.
    pub fn endpoint_count(&self) -> usize {
        self.lock().endpoints.len()
    }

    /// Number of live link ends.
    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One session's connection to a [`LocalHub`].
#[derive(Debug)]
pub struct LocalRendezvous {
    hub: LocalHub,
    endpoint: Option<EndpointAddress>,
    tx: mpsc::UnboundedSender<RendezvousEvent>,
    rx: mpsc::UnboundedReceiver<RendezvousEvent>,
}

impl LocalRendezvous {
    /// Currently acquired endpoint.
    pub fn endpoint(&self) -> Option<&EndpointAddress> {
        self.endpoint.as_ref()
    }

    fn require_endpoint(&self) -> Result<EndpointAddress, RendezvousError> {
        self.endpoint.clone().ok_or(RendezvousError::NoEndpoint)
    }

    fn require_owned(&self, hub: &HubState, link: LinkId) -> Result<(), RendezvousError> {
        let owned = hub
            .links
            .get(&link)
            .is_some_and(|end| self.endpoint.as_ref() == Some(&end.owner));
        if owned { Ok(()) } else { Err(RendezvousError::UnknownLink(link)) }
    }
}

impl Rendezvous for LocalRendezvous {
    async fn acquire_endpoint(&mut self) -> Result<EndpointAddress, RendezvousError> {
        if self.endpoint.is_some() {
            return Err(RendezvousError::EndpointInUse);
        }

        let mut hub = self.hub.lock();
        if !hub.available {
            return Err(RendezvousError::Unavailable { reason: "hub offline".to_string() });
        }

        hub.next_endpoint += 1;
        let endpoint = EndpointAddress::new(format!("peer-{}", hub.next_endpoint));
        hub.endpoints
            .insert(endpoint.clone(), Endpoint { events: self.tx.clone(), listening: false });
        drop(hub);

        tracing::debug!(%endpoint, "endpoint acquired");
        self.endpoint = Some(endpoint.clone());
        Ok(endpoint)
    }

    async fn listen(&mut self) -> Result<(), RendezvousError> {
        let endpoint = self.require_endpoint()?;
        let mut hub = self.hub.lock();
        if let Some(entry) = hub.endpoints.get_mut(&endpoint) {
            entry.listening = true;
        }
        Ok(())
    }

    async fn open_link(
        &mut self,
        remote: &EndpointAddress,
        options: LinkOptions,
    ) -> Result<LinkId, RendezvousError> {
        let endpoint = self.require_endpoint()?;
        let mut hub = self.hub.lock();

        let local = hub.allocate_link();
        hub.links.insert(local, LinkEnd { owner: endpoint.clone(), peer: None });

        let listening = hub.endpoints.get(remote).is_some_and(|e| e.listening);
        if !listening {
            tracing::debug!(%local, %remote, "remote endpoint not reachable");
            hub.deliver_link(local, LinkEvent::Error {
                reason: format!("endpoint {remote} not reachable"),
            });
            return Ok(local);
        }

        let accepted = hub.allocate_link();
        hub.links.insert(accepted, LinkEnd { owner: remote.clone(), peer: Some(local) });
        if let Some(end) = hub.links.get_mut(&local) {
            end.peer = Some(accepted);
        }

        tracing::debug!(%local, %accepted, %remote, reliable = options.reliable, "link paired");

        hub.deliver(remote, RendezvousEvent::IncomingLink { link: accepted });
        hub.deliver_link(accepted, LinkEvent::Open);
        hub.deliver_link(local, LinkEvent::Open);

        Ok(local)
    }

    async fn send(&mut self, link: LinkId, payload: Vec<u8>) -> Result<(), RendezvousError> {
        let hub = self.hub.lock();
        self.require_owned(&hub, link)?;

        // Frames to a closed peer are dropped like on a real transport.
        if let Some(peer) = hub.links.get(&link).and_then(|end| end.peer) {
            hub.deliver_link(peer, LinkEvent::Data(payload));
        }
        Ok(())
    }

    async fn close_link(&mut self, link: LinkId) -> Result<(), RendezvousError> {
        let mut hub = self.hub.lock();
        self.require_owned(&hub, link)?;
        hub.close(link);
        Ok(())
    }

    async fn release(&mut self) -> Result<(), RendezvousError> {
        let Some(endpoint) = self.endpoint.take() else {
            return Ok(());
        };

        let mut hub = self.hub.lock();
        let owned: Vec<LinkId> = hub
            .links
            .iter()
            .filter(|(_, end)| end.owner == endpoint)
            .map(|(id, _)| *id)
            .collect();
        for link in owned {
            hub.close(link);
        }
        hub.endpoints.remove(&endpoint);

        tracing::debug!(%endpoint, "endpoint released");
        Ok(())
    }

    async fn next_event(&mut self) -> Option<RendezvousEvent> {
        self.rx.recv().await
    }
}
