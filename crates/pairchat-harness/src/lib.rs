//! Deterministic simulation harness for pairchat session testing.
//!
//! Seeded implementations of the environment and presentation traits, plus a
//! two-session fixture, so session behavior can be replayed exactly.
//!
//! # Fixtures
//!
//! - [`Pair`]: two controllers sharing a directory, wired through an
//!   in-memory link with explicit event delivery. No async runtime needed.
//! - [`SimDriver`]: presentation driver for the real
//!   [`Runtime`](pairchat_app::Runtime), fed through a [`SimHandle`].
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold after every
//! event. Use [`InvariantRegistry::standard()`] for the session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod pair;
pub mod sim_driver;
pub mod sim_env;

pub use invariants::{
    ConnectedImpliesOpenLink, IdleHasEmptyLog, Invariant, InvariantRegistry, InvariantResult,
    RoleMatchesRoomCode, SessionSnapshot, SystemSnapshot, Violation,
};
pub use pair::{Pair, Side};
pub use sim_driver::{SimDriver, SimDriverError, SimHandle};
pub use sim_env::SimEnv;
