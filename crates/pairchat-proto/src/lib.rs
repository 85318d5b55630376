//! Wire types for pairchat.
//!
//! Two peers that rendezvous by room code exchange [`DataFrame`]s over a
//! direct link. This crate defines the shareable [`RoomCode`] and the JSON
//! frame codec; it has no notion of sessions or transports.
//!
//! # Frame format
//!
//! ```text
//! { "kind": "message", "text": "hello", "timestamp": "2024-05-01T12:00:00.000Z" }
//! ```
//!
//! Only the `message` kind is defined. Receivers ignore unknown kinds so that
//! newer peers can add frame kinds without breaking older ones.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod frame;
mod room_code;

pub use errors::ProtocolError;
pub use frame::{DataFrame, MESSAGE_KIND, MessageFrame};
pub use room_code::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode, normalize_code};
