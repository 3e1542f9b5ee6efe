//! Application layer for kernel-bridge
//!
//! This crate contains the session use case, port definitions, and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::DispatchParams;
pub use ports::{
    inference_backend::{BackendFault, InferenceBackend},
    transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger},
};
pub use use_cases::serve_session::{ServeSessionUseCase, SessionError, SessionSummary};
