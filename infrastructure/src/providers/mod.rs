//! Inference backend adapters
//!
//! [`build_backend`] turns the loaded configuration into the single
//! [`InferenceBackend`] shared by every session.

pub mod local;
pub mod remote;

use crate::config::FileConfig;
use bridge_application::InferenceBackend;
use bridge_domain::BackendKind;
use local::{LocalBackend, LocalModelError, LocalModelParams};
use remote::{RemoteBackendSettings, RemoteChatBackend};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors raised while constructing a backend at startup.
#[derive(Error, Debug)]
pub enum BackendInitError {
    #[error("API key not found: set the {0} environment variable (or add it to .env)")]
    MissingApiKey(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    LocalModel(#[from] LocalModelError),
}

/// Read the remote API key from the environment variable named in config.
pub fn resolve_api_key(var: &str) -> Result<String, BackendInitError> {
    std::env::var(var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| BackendInitError::MissingApiKey(var.to_string()))
}

/// Local model settings from the configuration.
pub fn local_model_params(config: &FileConfig) -> LocalModelParams {
    LocalModelParams {
        model_path: PathBuf::from(&config.local.model_path),
        context_size: config.local.effective_context_size(),
        threads: config.local.threads.max(1),
    }
}

/// Build the configured backend.
pub fn build_backend(config: &FileConfig) -> Result<Arc<dyn InferenceBackend>, BackendInitError> {
    let backend: Arc<dyn InferenceBackend> = match config.backend.kind {
        BackendKind::Remote => {
            let settings = RemoteBackendSettings {
                base_url: config.remote.base_url.clone(),
                model: config.remote.model.clone(),
                api_key: resolve_api_key(&config.remote.api_key_env)?,
                timeout: Duration::from_secs(config.remote.timeout_secs),
            };
            Arc::new(RemoteChatBackend::new(settings)?)
        }
        BackendKind::Local => Arc::new(LocalBackend::new(load_local_model(
            local_model_params(config),
        )?)),
    };

    info!(kind = %config.backend.kind, backend = %backend.describe(), "Backend ready");
    Ok(backend)
}

#[cfg(feature = "llama")]
fn load_local_model(
    params: LocalModelParams,
) -> Result<Arc<dyn local::LocalModel>, LocalModelError> {
    Ok(Arc::new(local::LlamaCppModel::load(params)?))
}

#[cfg(not(feature = "llama"))]
fn load_local_model(
    _params: LocalModelParams,
) -> Result<Arc<dyn local::LocalModel>, LocalModelError> {
    Err(LocalModelError::Unavailable)
}
