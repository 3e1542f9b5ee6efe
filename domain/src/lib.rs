//! Domain layer for kernel-bridge
//!
//! This crate contains the wire protocol, text shaping and backend value
//! types. It performs no I/O and has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Framing
//!
//! The kernel console streams arbitrary text. A request starts at the
//! `AI_REQ:` marker and ends at the next newline. [`RequestFramer`] finds
//! requests incrementally as fragments arrive.
//!
//! ## Reply lines
//!
//! Backend output is normalized ([`normalize_reply`]) into one ASCII-safe
//! line and encoded with a single terminator ([`WireLine`]).
//!
//! ## Failure policy
//!
//! A [`BackendKind`] decides whether a backend failure is answered on the
//! wire or stops the process ([`FailurePolicy`]).

pub mod backend;
pub mod core;
pub mod protocol;
pub mod text;

// Re-export commonly used types
pub use backend::{
    kind::{BackendKind, FailurePolicy},
    reply::BackendReply,
    request::{BackendRequest, DEFAULT_SYSTEM_PROMPT},
    sampling::{DEFAULT_MAX_TOKENS, SamplingConfig},
};
pub use core::{error::DomainError, string::truncate};
pub use protocol::{
    LINE_TERMINATOR, MARKER,
    decoder::Utf8Decoder,
    framer::{Frame, RequestFramer, SessionState},
    request::Request,
};
pub use text::{
    normalize::normalize_reply,
    wire::{FAILURE_PREFIX, WireLine},
};
