//! I/O side of pairchat.
//!
//! The session logic in `pairchat-core` is pure; this crate drives it.
//!
//! # Components
//!
//! - [`Rendezvous`]: contract of the service that hands out endpoints and
//!   carries links between them
//! - [`LocalHub`] / [`LocalRendezvous`]: in-process rendezvous over tokio
//!   channels
//! - [`Driver`]: presentation port (user intents in, notifications out)
//! - [`View`]: view model folded from notifications
//! - [`Runtime`]: generic loop tying a driver, a rendezvous and a
//!   [`SessionController`](pairchat_core::SessionController) together
//! - [`SystemEnv`]: production environment (system clock, OS entropy)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod env;
mod error;
mod local;
mod rendezvous;
mod runtime;
mod view;

pub use driver::{Driver, UserIntent};
pub use env::SystemEnv;
pub use error::{RendezvousError, RuntimeError};
pub use local::{LocalHub, LocalRendezvous};
pub use rendezvous::{Rendezvous, RendezvousEvent};
pub use runtime::{Runtime, RuntimeConfig};
pub use view::{ERROR_DISPLAY, View, ViewMessage};
