//! OpenAI-compatible chat-completion backend
//!
//! Sends each query as a `system` + `user` message pair to a hosted API
//! (Groq by default) and turns every transport or protocol problem into a
//! failure reply so the session keeps running.

mod backend;
mod types;

pub use backend::{RemoteBackendSettings, RemoteChatBackend};
