//! Shareable room codes.
//!
//! A room code is six characters from `[A-Z0-9]`, drawn uniformly at random by
//! the hosting side. Codes are short enough to read aloud, which also means
//! they are not globally unique: two hosts can draw the same code and the
//! later registration wins.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Number of characters in a room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Characters a room code is drawn from.
pub const ROOM_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest multiple of the alphabet size that fits in a byte. Bytes at or
/// above this are rejected so every character is equally likely.
const REJECTION_BOUND: u8 = (256 / ROOM_CODE_ALPHABET.len() * ROOM_CODE_ALPHABET.len()) as u8;

/// Validated room code.
///
/// Comparison is case-sensitive. Callers that accept free-form input should
/// pass it through [`normalize_code`] before [`RoomCode::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse a room code, rejecting anything but six characters of
    /// `[A-Z0-9]`.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let valid = input.len() == ROOM_CODE_LEN
            && input.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());

        if valid {
            Ok(Self(input.to_owned()))
        } else {
            Err(ProtocolError::InvalidRoomCode { input: input.to_owned() })
        }
    }

    /// Draw a fresh code from a source of random bytes.
    ///
    /// Uses rejection sampling, so `random_byte` may be called more than
    /// [`ROOM_CODE_LEN`] times.
    pub fn generate(mut random_byte: impl FnMut() -> u8) -> Self {
        let mut code = String::with_capacity(ROOM_CODE_LEN);
        while code.len() < ROOM_CODE_LEN {
            let byte = random_byte();
            if byte < REJECTION_BOUND {
                let index = usize::from(byte) % ROOM_CODE_ALPHABET.len();
                code.push(char::from(ROOM_CODE_ALPHABET[index]));
            }
        }
        Self(code)
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trim surrounding whitespace and uppercase user input.
///
/// The result is not guaranteed to be a valid code.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl AsRef<str> for RoomCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
