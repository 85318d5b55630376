//! Observable state snapshots for invariant checking.
//!
//! Invariants operate on snapshots rather than live controllers so every
//! check sees one consistent moment.

use pairchat_core::{Environment, RoomDirectory, SessionController, SessionState};

/// Snapshot of every session in the simulation.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-session snapshots.
    pub sessions: Vec<SessionSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no sessions).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single session.
    pub fn single(session: SessionSnapshot) -> Self {
        Self { sessions: vec![session] }
    }

    /// Add a session snapshot.
    pub fn add_session(&mut self, session: SessionSnapshot) {
        self.sessions.push(session);
    }
}

/// Snapshot of one session's observable state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Label for violation messages.
    pub label: &'static str,
    /// Session state.
    pub state: SessionState,
    /// Chat log length.
    pub log_len: usize,
}

impl SessionSnapshot {
    /// Capture a controller.
    pub fn capture<E: Environment, D: RoomDirectory>(
        label: &'static str,
        session: &SessionController<E, D>,
    ) -> Self {
        Self { label, state: session.state(), log_len: session.log().len() }
    }
}
