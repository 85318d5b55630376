//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources (wall clock, randomness).
//! Simulation uses a manual clock and seeded RNG; production uses the system
//! clock and OS entropy.

use chrono::{DateTime, Utc};

/// Abstract environment providing time and randomness.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - Given the same seed, `random_bytes()` produces the same sequence
/// - Methods are infallible except in exceptional circumstances (OS entropy
///   exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time.
    ///
    /// Used to stamp chat messages and room records. Not required to be
    /// monotonic; nothing in the session logic compares timestamps.
    fn now(&self) -> DateTime<Utc>;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random byte.
    fn random_u8(&self) -> u8 {
        let mut byte = [0u8; 1];
        self.random_bytes(&mut byte);
        byte[0]
    }
}
