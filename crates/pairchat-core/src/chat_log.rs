//! Chat log for the active session.

use chrono::{DateTime, Utc};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Typed locally.
    Own,
    /// Received from the peer.
    Peer,
    /// Produced by the session itself (peer connected, disconnected).
    System,
}

/// A message in the log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who produced the message.
    pub origin: Origin,
    /// Message text.
    pub text: String,
    /// Sender's clock for peer messages, local clock otherwise.
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// `HH:MM` label for rendering next to the message, in UTC.
    pub fn time_label(&self) -> String {
        self.sent_at.format("%H:%M").to_string()
    }
}

/// Ordered, append-only record of one session's messages.
///
/// Cleared when the session is torn down. Unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Remove all messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Messages in insertion order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the log has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent message. `None` if empty.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Iterate messages in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a ChatLog {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
