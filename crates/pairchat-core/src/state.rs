//! Observable session state.
//!
//! [`SessionState`] is a snapshot of what the controller currently believes.
//! It is what views render and what invariant checks inspect; the controller
//! keeps its own richer internal representation.

use pairchat_proto::RoomCode;

use crate::{EndpointAddress, LinkId, LinkState};

/// Which side of a room this session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// No room.
    Idle,
    /// Created the room.
    Host,
    /// Joined by code.
    Guest,
}

/// Connection indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// No open link.
    Disconnected,
    /// Link being established.
    Connecting,
    /// Link open.
    Connected,
}

/// Screen the presentation should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Create or join.
    Welcome,
    /// Host waiting for a guest, code on display.
    RoomCreated,
    /// Conversation.
    Chat,
}

/// Coarse state machine position.
///
/// ```text
///            createRoom              link open
///   Idle ──────────────> Hosting ──────────────┐
///    ^  │                                      v
///    │  │  joinRoom                        Connected
///    │  └──────────────> Joining ──────────────┘
///    │                                         │
///    └──────────────── leaveRoom ──────────────┘
/// ```
///
/// A closed link does not move the session back: `Connected` persists with
/// the link cleared until `leaveRoom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No room.
    Idle,
    /// Room created, waiting for the guest's link to open.
    Hosting,
    /// Joining by code, waiting for the link to open.
    Joining,
    /// The link opened at least once in this session.
    Connected,
}

/// The live link and its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSnapshot {
    /// Link identifier.
    pub id: LinkId,
    /// `Connecting` or `Open`; terminal links are dropped, not kept.
    pub state: LinkState,
}

/// Snapshot of the session.
///
/// # Invariants
///
/// - `role == Idle` iff `room_code.is_none()` iff `phase == Idle`
/// - `role == Idle` implies `link.is_none()` and `endpoint.is_none()`
/// - `connection_status == Connected` implies `link.state == Open`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Host, guest, or idle.
    pub role: Role,
    /// Coarse state machine position.
    pub phase: Phase,
    /// Active room code.
    pub room_code: Option<RoomCode>,
    /// Local endpoint, once acquired.
    pub endpoint: Option<EndpointAddress>,
    /// Live link. `None` before a link exists and after it closes.
    pub link: Option<LinkSnapshot>,
    /// Connection indicator.
    pub connection_status: ConnectionStatus,
}

impl SessionState {
    /// State of a session with no room.
    pub fn idle() -> Self {
        Self {
            role: Role::Idle,
            phase: Phase::Idle,
            room_code: None,
            endpoint: None,
            link: None,
            connection_status: ConnectionStatus::Disconnected,
        }
    }

    /// Returns true if the live link is open.
    pub fn link_open(&self) -> bool {
        self.link.is_some_and(|l| l.state == LinkState::Open)
    }
}
