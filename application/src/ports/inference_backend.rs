//! Inference backend port
//!
//! Defines the interface for obtaining a reply from an inference backend.

use async_trait::async_trait;
use bridge_domain::{BackendKind, BackendReply, BackendRequest};
use thiserror::Error;

/// Unrecoverable backend errors.
///
/// Only backends with a [`FailurePolicy::FailFast`](bridge_domain::FailurePolicy)
/// policy are expected to produce these. Recoverable failures are reported
/// as [`BackendReply::Failure`] instead.
#[derive(Error, Debug)]
pub enum BackendFault {
    #[error("Model failure: {0}")]
    Model(String),

    #[error("Inference worker crashed: {0}")]
    WorkerCrashed(String),
}

/// Inference backend shared by every session.
///
/// This port defines how the application layer obtains replies. Adapters
/// (local model, remote HTTP API) live in the infrastructure layer and must
/// be safe to call from several connections at once.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Which kind of backend this is; decides the failure policy.
    fn kind(&self) -> BackendKind;

    /// Short description for logs (model name or path).
    fn describe(&self) -> String;

    /// Answer one request.
    ///
    /// Returns `Ok(BackendReply::Failure(..))` for recoverable conditions and
    /// `Err(BackendFault)` only when the backend can no longer serve.
    async fn complete(&self, request: &BackendRequest) -> Result<BackendReply, BackendFault>;
}
