//! Backend reply

use crate::text::wire::WireLine;

/// What a backend hands back for one request.
///
/// A `Failure` is a recoverable condition (remote service down, bad
/// credentials, malformed response). It is still answered on the wire so
/// the client's line reader unblocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendReply {
    /// Raw generated text, not yet normalized.
    Text(String),
    /// Human-readable cause.
    Failure(String),
}

impl BackendReply {
    pub fn failure(cause: impl Into<String>) -> Self {
        BackendReply::Failure(cause.into())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BackendReply::Failure(_))
    }

    /// Normalize into the single line written to the client.
    pub fn to_wire_line(&self) -> WireLine {
        match self {
            BackendReply::Text(text) => WireLine::from_reply(text),
            BackendReply::Failure(cause) => WireLine::failure(cause),
        }
    }
}
