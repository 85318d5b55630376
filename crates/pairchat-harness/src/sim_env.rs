//! Seeded environment with a manual clock.
//!
//! Same seed, same room codes. Time only moves when a test advances it.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use pairchat_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 2024-01-01T00:00:00Z.
const START_MILLIS: i64 = 1_704_067_200_000;

#[derive(Debug)]
struct RngState {
    rng: ChaCha8Rng,
    /// Handed out before the RNG is consulted.
    scripted: VecDeque<u8>,
}

/// Deterministic environment for simulation.
///
/// Clones share the RNG and the clock.
#[derive(Debug, Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<RngState>>,
    clock_millis: Arc<AtomicI64>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl SimEnv {
    /// Environment seeded with `seed`, clock at 2024-01-01T00:00:00Z.
    pub fn with_seed(seed: u64) -> Self {
        let state = RngState { rng: ChaCha8Rng::seed_from_u64(seed), scripted: VecDeque::new() };
        Self {
            rng: Arc::new(Mutex::new(state)),
            clock_millis: Arc::new(AtomicI64::new(START_MILLIS)),
        }
    }

    /// Queue bytes to be returned before any RNG output.
    ///
    /// Lets a test pick the next room code: byte `i` selects alphabet index
    /// `i % 36` for bytes below the rejection bound.
    pub fn script_bytes(&self, bytes: &[u8]) {
        self.lock_rng().scripted.extend(bytes.iter().copied());
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.clock_millis.fetch_add(millis, Ordering::SeqCst);
    }

    fn lock_rng(&self) -> MutexGuard<'_, RngState> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.clock_millis.load(Ordering::SeqCst))
            .unwrap_or_default()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut state = self.lock_rng();
        for byte in buffer.iter_mut() {
            *byte = match state.scripted.pop_front() {
                Some(scripted) => scripted,
                None => (state.rng.next_u32() & 0xFF) as u8,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);

        let mut left = [0u8; 16];
        let mut right = [0u8; 16];
        a.random_bytes(&mut left);
        b.random_bytes(&mut right);

        assert_eq!(left, right);
    }

    #[test]
    fn scripted_bytes_come_first() {
        let env = SimEnv::with_seed(7);
        env.script_bytes(&[3, 4]);

        let mut bytes = [0u8; 2];
        env.random_bytes(&mut bytes);

        assert_eq!(bytes, [3, 4]);
    }

    #[test]
    fn clock_moves_only_when_advanced() {
        let env = SimEnv::default();
        let start = env.now();

        assert_eq!(env.now(), start);
        env.advance(Duration::from_secs(90));
        assert_eq!((env.now() - start).num_seconds(), 90);
    }
}
