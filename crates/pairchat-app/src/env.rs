//! Production environment using the system clock and OS entropy.
//!
//! Non-deterministic by nature: room codes come from getrandom and message
//! timestamps from the wall clock. Simulation uses `SimEnv` from the harness
//! instead.

use chrono::{DateTime, Utc};
use pairchat_core::Environment;

/// Production environment using system time and OS randomness.
///
/// # Panics
///
/// Panics if the OS RNG fails. Room codes drawn from a broken RNG would
/// collide, and the failure indicates an OS-level problem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bytes_differ() {
        let env = SystemEnv::new();

        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        env.random_bytes(&mut first);
        env.random_bytes(&mut second);

        assert_ne!(first, second, "Random bytes should differ");
    }

    #[test]
    fn clock_is_current() {
        let env = SystemEnv::new();
        let now = env.now();

        assert!(now.timestamp() > 1_700_000_000, "clock should be past 2023");
    }
}
