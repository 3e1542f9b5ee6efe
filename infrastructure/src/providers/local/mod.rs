//! In-process model backend
//!
//! A [`LocalModel`] generates text synchronously on the calling thread.
//! [`LocalBackend`] moves each generation onto tokio's blocking pool and
//! maps every model error to a [`BackendFault`](bridge_application::BackendFault),
//! which stops the bridge.

mod backend;
mod model;

#[cfg(feature = "llama")]
mod llama;

pub use backend::LocalBackend;
pub use model::{LocalModel, LocalModelError, LocalModelParams};

#[cfg(feature = "llama")]
pub use llama::LlamaCppModel;
