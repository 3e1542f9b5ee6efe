//! Infrastructure layer for kernel-bridge
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: inference backends, the TCP acceptor,
//! the JSONL transcript writer and configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod server;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, ContextProfile, FileConfig};
pub use logging::JsonlTranscriptLogger;
pub use providers::{
    BackendInitError, build_backend,
    local::{LocalBackend, LocalModel, LocalModelError},
    remote::RemoteChatBackend,
};
pub use server::{AcceptorSettings, ConnectionAcceptor, ServerError};
