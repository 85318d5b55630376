//! Presentation port.
//!
//! The [`Driver`] trait decouples the runtime from whatever renders the
//! session: a terminal, a GUI, or the simulation driver in tests.

use std::future::Future;

use pairchat_core::Notification;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// Host a new room.
    CreateRoom,
    /// Join a room. Raw input; the runtime normalizes it.
    JoinRoom(String),
    /// Send a chat message.
    SendMessage(String),
    /// Leave the current room.
    LeaveRoom,
    /// Stop the runtime.
    Quit,
}

/// Presentation side of the runtime.
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next user intent.
    ///
    /// Returns `None` when the user side has gone away, which stops the
    /// runtime like [`UserIntent::Quit`].
    fn poll_intent(
        &mut self,
    ) -> impl Future<Output = Result<Option<UserIntent>, Self::Error>> + Send;

    /// Present a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if presenting fails.
    fn notify(&mut self, notification: &Notification) -> Result<(), Self::Error>;

    /// Clean up before the runtime returns.
    fn stop(&mut self);
}
