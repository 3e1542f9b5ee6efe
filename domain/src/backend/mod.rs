//! Backend call contract.
//!
//! Value types exchanged with an inference backend. The backend itself is a
//! port defined in the application layer; this module only describes what
//! goes in ([`BackendRequest`], [`SamplingConfig`]) and what comes out
//! ([`BackendReply`]), plus which failure policy each backend kind follows.

pub mod kind;
pub mod reply;
pub mod request;
pub mod sampling;
