//! Pairchat core
//!
//! Session lifecycle for two-party chat rooms identified by a short room
//! code. One side hosts a room and waits; the other joins by code, and once a
//! direct link opens, messages flow end-to-end.
//!
//! # Architecture
//!
//! Everything here is Sans-IO. The [`SessionController`] consumes
//! [`SessionEvent`]s (user intents, rendezvous completions, link lifecycle)
//! and returns [`SessionAction`]s for a runtime to execute. Time and
//! randomness come from an injected [`Environment`]; the room-code table is an
//! injected [`RoomDirectory`]. No sockets, no tasks, no clocks.
//!
//! # Components
//!
//! - [`SessionController`]: the state machine
//! - [`RoomDirectory`]: room code to endpoint table, with [`MemoryDirectory`]
//! - [`ChatLog`]: append-only message record for the active session
//! - [`Environment`]: time and randomness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod chat_log;
pub mod directory;
pub mod env;
mod error;
mod event;
mod link;
mod session;
mod state;

pub use action::{Notification, SessionAction};
pub use chat_log::{ChatLog, ChatMessage, Origin};
pub use directory::{MemoryDirectory, RoomDirectory, RoomRecord};
pub use env::Environment;
pub use error::{ErrorKind, SessionError};
pub use event::SessionEvent;
pub use link::{EndpointAddress, LinkEvent, LinkId, LinkOptions, LinkState};
pub use pairchat_proto::RoomCode;
pub use session::{SessionConfig, SessionController, SystemMessages};
pub use state::{ConnectionStatus, LinkSnapshot, Phase, Role, Screen, SessionState};
