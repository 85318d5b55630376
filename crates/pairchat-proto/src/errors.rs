//! Protocol error types.

use thiserror::Error;

/// Errors produced while parsing room codes or decoding frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Input is not exactly six characters from `[A-Z0-9]`.
    #[error("invalid room code {input:?}: expected 6 characters from [A-Z0-9]")]
    InvalidRoomCode {
        /// The rejected input, verbatim.
        input: String,
    },

    /// Frame bytes are not a JSON object.
    #[error("frame is not a JSON object: {0}")]
    Json(String),

    /// Frame object has no string `kind` field.
    #[error("frame has no \"kind\" field")]
    MissingKind,

    /// Frame kind is known but its body does not match.
    #[error("malformed {kind} frame: {reason}")]
    MalformedFrame {
        /// Frame kind that failed to decode.
        kind: &'static str,
        /// Decoder message.
        reason: String,
    },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
