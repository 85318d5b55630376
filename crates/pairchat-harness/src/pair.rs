//! Two sessions wired through an in-memory link.
//!
//! [`Pair`] executes each controller's actions itself: endpoint requests are
//! answered on the spot, and link events are queued so a test decides when
//! (and whether) they are delivered. Everything is synchronous and seeded,
//! so a failing sequence replays exactly.
//!
//! Link semantics match the in-process hub: each end has its own id,
//! opening a link to a listening endpoint queues `IncomingLink` and `Open`
//! for the remote end and `Open` for the opener, and closing or releasing
//! one end queues `Close` for the other.

use std::collections::{HashMap, VecDeque};

use pairchat_core::{
    EndpointAddress, LinkEvent, LinkId, MemoryDirectory, Notification, SessionAction,
    SessionController, SessionEvent,
};

use crate::{SessionSnapshot, SimEnv, SystemSnapshot};

/// One of the two sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// First session. Hosts in most scenarios.
    A,
    /// Second session.
    B,
}

impl Side {
    /// The other session.
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }
}

#[derive(Debug)]
struct LinkEnd {
    owner: Side,
    peer: Option<LinkId>,
}

#[derive(Debug, Default)]
struct Peer {
    endpoint: Option<EndpointAddress>,
    listening: bool,
    notifications: Vec<Notification>,
    /// Rendezvous operations executed for this side.
    rendezvous_calls: usize,
}

/// Two controllers sharing one directory.
#[derive(Debug)]
pub struct Pair {
    env: SimEnv,
    directory: MemoryDirectory,
    sessions: [SessionController<SimEnv, MemoryDirectory>; 2],
    peers: [Peer; 2],
    links: HashMap<LinkId, LinkEnd>,
    in_flight: VecDeque<(Side, SessionEvent)>,
    available: bool,
    next_endpoint: u64,
    next_link: u64,
}

impl Pair {
    /// Two idle sessions over a seeded environment.
    pub fn new(seed: u64) -> Self {
        let env = SimEnv::with_seed(seed);
        let directory = MemoryDirectory::new();
        let sessions = [
            SessionController::new(env.clone(), directory.clone()),
            SessionController::new(env.clone(), directory.clone()),
        ];

        Self {
            env,
            directory,
            sessions,
            peers: [Peer::default(), Peer::default()],
            links: HashMap::new(),
            in_flight: VecDeque::new(),
            available: true,
            next_endpoint: 0,
            next_link: 0,
        }
    }

    /// Shared environment (clock, scripted randomness).
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Shared directory.
    pub fn directory(&self) -> &MemoryDirectory {
        &self.directory
    }

    /// One side's controller.
    pub fn session(&self, side: Side) -> &SessionController<SimEnv, MemoryDirectory> {
        &self.sessions[side.index()]
    }

    /// Notifications one side has emitted, oldest first.
    pub fn notifications(&self, side: Side) -> &[Notification] {
        &self.peers[side.index()].notifications
    }

    /// Rendezvous operations executed for one side.
    pub fn rendezvous_calls(&self, side: Side) -> usize {
        self.peers[side.index()].rendezvous_calls
    }

    /// Make endpoint acquisition fail (`false`) or succeed (`true`).
    pub fn set_rendezvous_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Link events queued but not yet delivered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Hand an event to one side and execute what it produces.
    ///
    /// Endpoint and link-start completions are fed back immediately; link
    /// events are queued.
    pub fn apply(&mut self, side: Side, event: SessionEvent) {
        let mut pending: VecDeque<SessionAction> =
            self.sessions[side.index()].handle(event).into();

        while let Some(action) = pending.pop_front() {
            if let Some(follow_up) = self.execute(side, action) {
                pending.extend(self.sessions[side.index()].handle(follow_up));
            }
        }
    }

    /// Deliver the oldest queued link event. Returns false if none.
    pub fn deliver_next(&mut self) -> bool {
        let Some((side, event)) = self.in_flight.pop_front() else {
            return false;
        };
        self.apply(side, event);
        true
    }

    /// Drop the oldest queued link event. Returns false if none.
    pub fn drop_next(&mut self) -> bool {
        let Some((side, event)) = self.in_flight.pop_front() else {
            return false;
        };
        tracing::debug!(?side, ?event, "dropping in-flight event");
        true
    }

    /// Deliver queued events until none are left.
    pub fn settle(&mut self) {
        while self.deliver_next() {}
    }

    /// [`apply`](Self::apply) then [`settle`](Self::settle).
    pub fn act(&mut self, side: Side, event: SessionEvent) {
        self.apply(side, event);
        self.settle();
    }

    /// Snapshot of both sessions.
    pub fn snapshot(&self) -> SystemSnapshot {
        let mut snapshot = SystemSnapshot::empty();
        for side in [Side::A, Side::B] {
            snapshot.add_session(SessionSnapshot::capture(side.label(), self.session(side)));
        }
        snapshot
    }

    fn execute(&mut self, side: Side, action: SessionAction) -> Option<SessionEvent> {
        if !matches!(action, SessionAction::Notify(_)) {
            self.peers[side.index()].rendezvous_calls += 1;
        }

        match action {
            SessionAction::AcquireEndpoint => Some(self.acquire_endpoint(side)),
            SessionAction::Listen => {
                self.peers[side.index()].listening = true;
                None
            },
            SessionAction::OpenLink { remote, .. } => {
                let link = self.open_link(side, &remote);
                Some(SessionEvent::LinkStarted { link })
            },
            SessionAction::Send { link, payload } => {
                let peer = self
                    .links
                    .get(&link)
                    .filter(|end| end.owner == side)
                    .and_then(|end| end.peer);
                if let Some(peer) = peer {
                    self.queue_link(peer, LinkEvent::Data(payload));
                }
                None
            },
            SessionAction::CloseLink { link } => {
                if self.links.get(&link).is_some_and(|end| end.owner == side) {
                    self.close(link);
                }
                None
            },
            SessionAction::ReleaseEndpoint => {
                self.release(side);
                None
            },
            SessionAction::Notify(notification) => {
                self.peers[side.index()].notifications.push(notification);
                None
            },
        }
    }

    fn acquire_endpoint(&mut self, side: Side) -> SessionEvent {
        if !self.available {
            return SessionEvent::EndpointFailed { reason: "rendezvous offline".to_string() };
        }

        self.next_endpoint += 1;
        let endpoint = EndpointAddress::new(format!("peer-{}", self.next_endpoint));
        self.peers[side.index()].endpoint = Some(endpoint.clone());
        SessionEvent::EndpointAcquired { endpoint }
    }

    fn open_link(&mut self, side: Side, remote: &EndpointAddress) -> LinkId {
        let local = self.allocate_link();
        self.links.insert(local, LinkEnd { owner: side, peer: None });

        let target = [Side::A, Side::B].into_iter().find(|s| {
            let peer = &self.peers[s.index()];
            peer.listening && peer.endpoint.as_ref() == Some(remote)
        });

        let Some(target) = target else {
            tracing::debug!(?side, %remote, "remote endpoint not reachable");
            self.queue_link(local, LinkEvent::Error {
                reason: format!("endpoint {remote} not reachable"),
            });
            return local;
        };

        let accepted = self.allocate_link();
        self.links.insert(accepted, LinkEnd { owner: target, peer: Some(local) });
        if let Some(end) = self.links.get_mut(&local) {
            end.peer = Some(accepted);
        }

        self.in_flight.push_back((target, SessionEvent::IncomingLink { link: accepted }));
        self.queue_link(accepted, LinkEvent::Open);
        self.queue_link(local, LinkEvent::Open);
        local
    }

    fn close(&mut self, link: LinkId) {
        let Some(end) = self.links.remove(&link) else {
            return;
        };
        if let Some(peer) = end.peer {
            if let Some(peer_end) = self.links.get_mut(&peer) {
                peer_end.peer = None;
            }
            self.queue_link(peer, LinkEvent::Close);
        }
    }

    fn release(&mut self, side: Side) {
        let owned: Vec<LinkId> = self
            .links
            .iter()
            .filter(|(_, end)| end.owner == side)
            .map(|(id, _)| *id)
            .collect();
        for link in owned {
            self.close(link);
        }

        let peer = &mut self.peers[side.index()];
        peer.endpoint = None;
        peer.listening = false;
    }

    fn queue_link(&mut self, link: LinkId, event: LinkEvent) {
        if let Some(end) = self.links.get(&link) {
            self.in_flight.push_back((end.owner, SessionEvent::Link { link, event }));
        }
    }

    fn allocate_link(&mut self) -> LinkId {
        self.next_link += 1;
        LinkId(self.next_link)
    }
}

#[cfg(test)]
mod tests {
    use pairchat_core::{ConnectionStatus, Role};

    use super::*;

    fn connected() -> Pair {
        let mut pair = Pair::new(1);
        pair.act(Side::A, SessionEvent::CreateRoom);
        let code = pair.session(Side::A).room_code().unwrap().to_string();
        pair.act(Side::B, SessionEvent::JoinRoom { code });
        pair
    }

    #[test]
    fn join_connects_both_sides() {
        let pair = connected();

        for side in [Side::A, Side::B] {
            assert_eq!(pair.session(side).connection_status(), ConnectionStatus::Connected);
        }
        assert_eq!(pair.session(Side::A).state().role, Role::Host);
        assert_eq!(pair.session(Side::B).state().role, Role::Guest);
        assert_eq!(pair.in_flight(), 0);
    }

    #[test]
    fn undelivered_open_keeps_guest_connecting() {
        let mut pair = Pair::new(1);
        pair.act(Side::A, SessionEvent::CreateRoom);
        let code = pair.session(Side::A).room_code().unwrap().to_string();
        pair.apply(Side::B, SessionEvent::JoinRoom { code });

        assert_eq!(pair.session(Side::B).connection_status(), ConnectionStatus::Connecting);
        assert_eq!(pair.in_flight(), 3);
    }

    #[test]
    fn release_closes_peer_link() {
        let mut pair = connected();
        pair.act(Side::B, SessionEvent::LeaveRoom);

        assert_eq!(pair.session(Side::A).connection_status(), ConnectionStatus::Disconnected);
        assert_eq!(pair.session(Side::B).state().role, Role::Idle);
    }

    #[test]
    fn offline_rendezvous_fails_acquisition() {
        let mut pair = Pair::new(1);
        pair.set_rendezvous_available(false);
        pair.act(Side::A, SessionEvent::CreateRoom);

        assert_eq!(pair.session(Side::A).state().role, Role::Idle);
        assert!(pair.directory().is_empty());
    }
}
