//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold between events. Unlike
//! example-based tests that check specific scenarios, invariants verify
//! behavioral properties across all execution paths.
//!
//! # Architecture
//!
//! Observable state is captured from each controller into a
//! [`SystemSnapshot`], then every registered [`Invariant`] runs against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.assert_all(&pair.snapshot(), "after join");
//! ```

mod checks;
mod snapshot;

pub use checks::{ConnectedImpliesOpenLink, IdleHasEmptyLog, RoleMatchesRoomCode};
pub use snapshot::{SessionSnapshot, SystemSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// A broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Which session, and what it held.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property checked against every snapshot.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the session invariants.
    ///
    /// Includes:
    /// - [`RoleMatchesRoomCode`]: idle role iff no room code iff idle phase
    /// - [`ConnectedImpliesOpenLink`]: connected status needs an open link
    /// - [`IdleHasEmptyLog`]: idle sessions hold nothing
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(RoleMatchesRoomCode);
        registry.add(ConnectedImpliesOpenLink);
        registry.add(IdleHasEmptyLog);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Names of the registered invariants, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.invariants.iter().map(|inv| inv.name()).collect()
    }

    /// Run every invariant. Collects all violations, not just the first.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every invariant and panic with all violations.
    ///
    /// `context` names the step that produced the snapshot.
    #[allow(clippy::panic, reason = "Test assertion helper")]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pairchat_core::{Role, SessionState};

    use super::*;

    #[test]
    fn standard_registry_has_session_invariants() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.names(), [
            "RoleMatchesRoomCode",
            "ConnectedImpliesOpenLink",
            "IdleHasEmptyLog"
        ]);
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(registry.check_all(&SystemSnapshot::empty()).is_ok());
    }

    #[test]
    fn all_violations_are_reported() {
        let broken = SessionState { role: Role::Guest, ..SessionState::idle() };
        let snapshot = SystemSnapshot::single(SessionSnapshot {
            label: "guest",
            state: broken,
            log_len: 0,
        });

        let violations = InvariantRegistry::standard().check_all(&snapshot).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.starts_with("guest:"));
    }
}
