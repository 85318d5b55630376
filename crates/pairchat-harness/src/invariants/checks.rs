//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use pairchat_core::{ConnectionStatus, Phase, Role};

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// Idle role, missing room code and idle phase go together.
///
/// A session either has a room (host or guest, code set, non-idle phase) or
/// has nothing. A code without a role would be shown with no way to leave.
pub struct RoleMatchesRoomCode;

impl Invariant for RoleMatchesRoomCode {
    fn name(&self) -> &'static str {
        "RoleMatchesRoomCode"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            let s = &session.state;
            let idle = s.role == Role::Idle;
            if idle != s.room_code.is_none() || idle != (s.phase == Phase::Idle) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{}: role {:?}, phase {:?}, room code {:?}",
                        session.label, s.role, s.phase, s.room_code
                    ),
                });
            }
        }
        Ok(())
    }
}

/// `Connected` status requires an open live link.
pub struct ConnectedImpliesOpenLink;

impl Invariant for ConnectedImpliesOpenLink {
    fn name(&self) -> &'static str {
        "ConnectedImpliesOpenLink"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            let s = &session.state;
            if s.connection_status == ConnectionStatus::Connected && !s.link_open() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{}: connected with link {:?}", session.label, s.link),
                });
            }
        }
        Ok(())
    }
}

/// An idle session holds no log, link, or endpoint.
///
/// Leaving must release everything the session acquired.
pub struct IdleHasEmptyLog;

impl Invariant for IdleHasEmptyLog {
    fn name(&self) -> &'static str {
        "IdleHasEmptyLog"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            let s = &session.state;
            if s.role != Role::Idle {
                continue;
            }
            if session.log_len > 0 || s.link.is_some() || s.endpoint.is_some() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{}: idle with {} messages, link {:?}, endpoint {:?}",
                        session.label, session.log_len, s.link, s.endpoint
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pairchat_core::{LinkId, LinkSnapshot, LinkState, SessionState};

    use super::*;
    use crate::SessionSnapshot;

    fn snapshot(state: SessionState, log_len: usize) -> SystemSnapshot {
        SystemSnapshot::single(SessionSnapshot { label: "a", state, log_len })
    }

    #[test]
    fn idle_state_passes() {
        let state = snapshot(SessionState::idle(), 0);

        assert!(RoleMatchesRoomCode.check(&state).is_ok());
        assert!(ConnectedImpliesOpenLink.check(&state).is_ok());
        assert!(IdleHasEmptyLog.check(&state).is_ok());
    }

    #[test]
    fn host_without_code_is_flagged() {
        let state = snapshot(SessionState { role: Role::Host, ..SessionState::idle() }, 0);

        let violation = RoleMatchesRoomCode.check(&state).unwrap_err();
        assert_eq!(violation.invariant, "RoleMatchesRoomCode");
    }

    #[test]
    fn connected_on_connecting_link_is_flagged() {
        let state = snapshot(
            SessionState {
                link: Some(LinkSnapshot { id: LinkId(1), state: LinkState::Connecting }),
                connection_status: ConnectionStatus::Connected,
                ..SessionState::idle()
            },
            0,
        );

        assert!(ConnectedImpliesOpenLink.check(&state).is_err());
    }

    #[test]
    fn idle_with_messages_is_flagged() {
        let state = snapshot(SessionState::idle(), 2);

        assert!(IdleHasEmptyLog.check(&state).is_err());
    }
}
