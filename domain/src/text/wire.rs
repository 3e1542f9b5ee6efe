//! Reply wire encoding

use super::normalize::normalize_reply;
use crate::protocol::LINE_TERMINATOR;
use std::fmt;

/// Prefix of the line sent when the backend could not produce a reply.
pub const FAILURE_PREFIX: &str = "ERROR:";

/// A normalized reply line, ready to be written to the client.
///
/// The text never contains a line terminator; [`WireLine::to_bytes`] adds
/// exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireLine {
    text: String,
}

impl WireLine {
    /// Normalize raw backend text into a wire line.
    pub fn from_reply(raw: &str) -> Self {
        Self {
            text: normalize_reply(raw),
        }
    }

    /// Build the line reporting a backend failure to the client.
    pub fn failure(cause: &str) -> Self {
        Self::from_reply(&format!("{} {}", FAILURE_PREFIX, cause))
    }

    /// The normalized text, without terminator.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether this line reports a failure.
    pub fn is_failure(&self) -> bool {
        self.text.starts_with(FAILURE_PREFIX)
    }

    /// Encode the line with its single terminator.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.text.len() + 1);
        bytes.extend_from_slice(self.text.as_bytes());
        bytes.push(LINE_TERMINATOR as u8);
        bytes
    }
}

impl fmt::Display for WireLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_gets_exactly_one_terminator() {
        let line = WireLine::from_reply("Four.\nThat is all.\n");
        assert_eq!(line.to_bytes(), b"Four. That is all.\n".to_vec());
    }

    #[test]
    fn test_empty_reply_is_still_a_line() {
        assert_eq!(WireLine::from_reply("").to_bytes(), b"\n".to_vec());
    }

    #[test]
    fn test_failure_line() {
        let line = WireLine::failure("connection refused\n(os error 111)");
        assert_eq!(line.as_str(), "ERROR: connection refused (os error 111)");
        assert!(line.is_failure());
        assert!(!WireLine::from_reply("fine").is_failure());
    }
}
