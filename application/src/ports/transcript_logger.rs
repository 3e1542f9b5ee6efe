//! Port for structured transcript logging.
//!
//! Defines the [`TranscriptLogger`] trait for recording bridge events
//! (connections, queries, reply lines, failures) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! query/reply transcript in a machine-readable format (JSONL).

use serde::Serialize;

/// A structured transcript event.
///
/// Serializes as a flat JSON object whose `type` field names the variant
/// in snake case (`session_opened`, `reply`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEvent {
    SessionOpened {
        peer: String,
    },
    /// A marker was followed only by whitespace.
    Discarded {
        peer: String,
    },
    Request {
        peer: String,
        query: String,
    },
    /// The normalized line written back to the client.
    Reply {
        peer: String,
        line: String,
        elapsed_ms: u64,
    },
    /// A failure that was answered with an `ERROR:` line.
    Failure {
        peer: String,
        cause: String,
        elapsed_ms: u64,
    },
    /// A fault that ended the process; no reply was written.
    Fault {
        peer: String,
        cause: String,
    },
    SessionClosed {
        peer: String,
        answered: usize,
        discarded: usize,
        failures: usize,
        bytes_read: usize,
        unterminated_bytes: usize,
    },
}

impl TranscriptEvent {
    /// Event type identifier, as written in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            TranscriptEvent::SessionOpened { .. } => "session_opened",
            TranscriptEvent::Discarded { .. } => "discarded",
            TranscriptEvent::Request { .. } => "request",
            TranscriptEvent::Reply { .. } => "reply",
            TranscriptEvent::Failure { .. } => "failure",
            TranscriptEvent::Fault { .. } => "fault",
            TranscriptEvent::SessionClosed { .. } => "session_closed",
        }
    }
}

/// Port for logging transcript events.
///
/// The `log` method is intentionally synchronous and non-fallible: a broken
/// transcript must never disturb a session.
pub trait TranscriptLogger: Send + Sync {
    /// Record a transcript event.
    fn log(&self, event: TranscriptEvent);
}

/// No-op implementation for tests and when transcripts are disabled.
pub struct NoTranscriptLogger;

impl TranscriptLogger for NoTranscriptLogger {
    fn log(&self, _event: TranscriptEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_flat_with_type_tag() {
        let event = TranscriptEvent::Reply {
            peer: "127.0.0.1:5000".to_string(),
            line: "Hi there".to_string(),
            elapsed_ms: 12,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "reply",
                "peer": "127.0.0.1:5000",
                "line": "Hi there",
                "elapsed_ms": 12,
            })
        );
    }

    #[test]
    fn test_kind_matches_serialized_type() {
        let events = [
            TranscriptEvent::SessionOpened { peer: "p".to_string() },
            TranscriptEvent::Discarded { peer: "p".to_string() },
            TranscriptEvent::Fault {
                peer: "p".to_string(),
                cause: "boom".to_string(),
            },
            TranscriptEvent::SessionClosed {
                peer: "p".to_string(),
                answered: 1,
                discarded: 0,
                failures: 0,
                bytes_read: 10,
                unterminated_bytes: 0,
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.kind());
        }
    }
}
