//! Link data frames.
//!
//! Frames travel as JSON objects tagged by a `kind` field. Decoding returns
//! `Ok(None)` for a well-formed object whose kind this version does not know,
//! so callers can drop it without treating it as a fault.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

/// `kind` tag of a chat message frame.
pub const MESSAGE_KIND: &str = "message";

/// Chat message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFrame {
    /// Message text as typed by the sender (already trimmed).
    pub text: String,

    /// Sender's wall-clock time, ISO-8601 with millisecond precision on the
    /// wire.
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
}

/// Application-level payload exchanged over a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataFrame {
    /// Chat message.
    Message(MessageFrame),
}

#[derive(Serialize)]
struct Envelope<'a, B: Serialize> {
    kind: &'static str,
    #[serde(flatten)]
    body: &'a B,
}

impl DataFrame {
    /// Build a message frame.
    pub fn message(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::Message(MessageFrame { text: text.into(), timestamp })
    }

    /// Wire `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => MESSAGE_KIND,
        }
    }

    /// Serialize to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let bytes = match self {
            Self::Message(body) => serde_json::to_vec(&Envelope { kind: self.kind(), body })?,
        };
        Ok(bytes)
    }

    /// Deserialize from JSON bytes.
    ///
    /// Returns `Ok(None)` for an object with an unrecognized `kind`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Json` if the bytes are not a JSON object
    /// - `ProtocolError::MissingKind` if there is no string `kind` field
    /// - `ProtocolError::MalformedFrame` if a known kind has a bad body
    pub fn decode(bytes: &[u8]) -> Result<Option<Self>, ProtocolError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let Value::Object(ref object) = value else {
            return Err(ProtocolError::Json("expected an object".to_string()));
        };

        let kind = object.get("kind").and_then(Value::as_str).ok_or(ProtocolError::MissingKind)?;
        if kind != MESSAGE_KIND {
            return Ok(None);
        }

        let body = serde_json::from_value::<MessageFrame>(value).map_err(|e| {
            ProtocolError::MalformedFrame { kind: MESSAGE_KIND, reason: e.to_string() }
        })?;
        Ok(Some(Self::Message(body)))
    }
}

/// Millisecond ISO-8601 timestamps, the format browsers produce with
/// `Date.prototype.toISOString`.
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw).map(|t| t.with_timezone(&Utc)).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn encode_matches_wire_shape() {
        let frame = DataFrame::message("hello", noon());
        let bytes = frame.encode().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["kind"], "message");
        assert_eq!(value["text"], "hello");
        assert_eq!(value["timestamp"], "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn decode_browser_frame() {
        let raw = br#"{"type":"ignored","kind":"message","text":"hi","timestamp":"2024-05-01T12:00:00.250Z"}"#;
        let frame = DataFrame::decode(raw).unwrap().unwrap();

        let DataFrame::Message(body) = frame;
        assert_eq!(body.text, "hi");
        assert_eq!(body.timestamp.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn decode_unknown_kind_is_none() {
        let raw = br#"{"kind":"typing","active":true}"#;
        assert_eq!(DataFrame::decode(raw).unwrap(), None);
    }

    #[test]
    fn decode_missing_kind_fails() {
        let raw = br#"{"text":"hi"}"#;
        assert_eq!(DataFrame::decode(raw), Err(ProtocolError::MissingKind));
    }

    #[test]
    fn decode_non_object_fails() {
        assert!(matches!(DataFrame::decode(b"[1,2]"), Err(ProtocolError::Json(_))));
        assert!(matches!(DataFrame::decode(b"not json"), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn decode_bad_message_body_fails() {
        let raw = br#"{"kind":"message","text":"hi","timestamp":"yesterday"}"#;
        assert!(matches!(
            DataFrame::decode(raw),
            Err(ProtocolError::MalformedFrame { kind: MESSAGE_KIND, .. })
        ));
    }
}
