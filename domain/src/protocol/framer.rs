//! Incremental request framer.
//!
//! [`RequestFramer`] consumes decoded text fragments and emits a [`Frame`]
//! every time a marker is followed by a line terminator. It never rescans
//! text it has already looked at:
//!
//! - While no marker is pending, non-matching text is dropped as soon as it
//!   is scanned, except for a short tail that could be the start of a
//!   marker split across fragments.
//! - Once a marker is seen, everything up to and including it is dropped,
//!   so the buffer holds only the candidate query.
//! - A later marker before the terminator replaces the earlier one (the
//!   query is the text after the **last** marker).

use super::request::Request;
use super::{LINE_TERMINATOR, MARKER};
use std::fmt;

/// Session state as seen by the connection loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Reading bytes and scanning for a complete request.
    Accumulating,
    /// A request was framed and the backend call is outstanding.
    Dispatching,
    /// The peer closed the connection; the session is over.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Accumulating => "accumulating",
            SessionState::Dispatching => "dispatching",
            SessionState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a completed marker + terminator pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A non-empty query ready for dispatch.
    Request(Request),
    /// The marker was followed only by whitespace.
    Discarded,
}

/// Per-connection incremental scanner.
#[derive(Debug, Default)]
pub struct RequestFramer {
    /// Noise tail (no marker pending) or candidate query (marker pending).
    buffer: String,
    /// Byte offset in `buffer` where the next scan resumes.
    scan_from: usize,
    /// Whether a marker has been seen since the last completed frame.
    marker_pending: bool,
}

impl RequestFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded fragment and return every frame it completes, in order.
    ///
    /// Most fragments complete zero or one frame; a fragment carrying several
    /// terminated requests yields one frame per request.
    pub fn push(&mut self, fragment: &str) -> Vec<Frame> {
        self.buffer.push_str(fragment);
        let mut frames = Vec::new();

        loop {
            let rest = &self.buffer[self.scan_from..];
            let marker_at = rest.find(MARKER);
            let terminator_at = if self.marker_pending {
                rest.find(LINE_TERMINATOR)
            } else {
                None
            };

            match (marker_at, terminator_at) {
                (marker, Some(end)) if marker.is_none_or(|m| end < m) => {
                    let end = self.scan_from + end;
                    let frame = match Request::from_raw(&self.buffer[..end]) {
                        Some(request) => Frame::Request(request),
                        None => Frame::Discarded,
                    };
                    self.buffer.drain(..end + LINE_TERMINATOR.len_utf8());
                    self.scan_from = 0;
                    self.marker_pending = false;
                    frames.push(frame);
                }
                (Some(start), _) => {
                    let query_start = self.scan_from + start + MARKER.len();
                    self.buffer.drain(..query_start);
                    self.scan_from = 0;
                    self.marker_pending = true;
                }
                _ => break,
            }
        }

        self.settle();
        frames
    }

    /// Drop scanned noise and move the resume offset to the last position
    /// where a split marker could still begin.
    fn settle(&mut self) {
        let mut tail_start = self.buffer.len().saturating_sub(MARKER.len() - 1);
        while !self.buffer.is_char_boundary(tail_start) {
            tail_start -= 1;
        }

        if self.marker_pending {
            self.scan_from = tail_start.max(self.scan_from);
        } else {
            self.buffer.drain(..tail_start);
            self.scan_from = 0;
        }
    }

    /// Whether a marker has been seen and its terminator is still awaited.
    pub fn is_request_pending(&self) -> bool {
        self.marker_pending
    }

    /// Text currently held (pending query or the noise tail).
    pub fn buffered(&self) -> &str {
        &self.buffer
    }
}
