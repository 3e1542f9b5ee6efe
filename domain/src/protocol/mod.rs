//! Request framing over a chunked text stream.
//!
//! The kernel console writes free-form output to the socket. A request is
//! the text following the [`MARKER`] token, terminated by [`LINE_TERMINATOR`]:
//!
//! ```text
//! [boot] mounting fs... AI_REQ: what is 2+2\n
//!                       ^^^^^^^ ^^^^^^^^^^^ ^^
//!                       marker  query       terminator
//! ```
//!
//! - [`decoder::Utf8Decoder`]: lenient incremental byte → text decoding
//! - [`framer::RequestFramer`]: incremental marker/terminator scanner
//! - [`request::Request`]: an extracted, non-empty query

pub mod decoder;
pub mod framer;
pub mod request;

/// Literal token announcing a request in the client byte stream.
pub const MARKER: &str = "AI_REQ:";

/// Character that completes a request (and terminates every reply line).
pub const LINE_TERMINATOR: char = '\n';
