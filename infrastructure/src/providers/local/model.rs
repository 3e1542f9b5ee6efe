//! Local model abstraction

use bridge_domain::BackendRequest;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a local model.
#[derive(Error, Debug)]
pub enum LocalModelError {
    #[error("Failed to load model {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Failed to create inference context: {0}")]
    Context(String),

    #[error("Prompt of {prompt} tokens does not fit a {context}-token context")]
    PromptTooLong { prompt: usize, context: u32 },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Local backend is not available in this build (enable the `llama` feature)")]
    Unavailable,
}

/// Load-time settings for a local model.
#[derive(Debug, Clone)]
pub struct LocalModelParams {
    pub model_path: PathBuf,
    /// Context window in tokens
    pub context_size: u32,
    pub threads: u32,
}

/// A model that runs inside this process.
///
/// `generate` blocks until the reply is complete. Implementations must
/// serialize access to their own native state.
pub trait LocalModel: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// Produce raw reply text for one request.
    fn generate(&self, request: &BackendRequest) -> Result<String, LocalModelError>;
}

/// Tokens left for the reply once the prompt is in the context window.
///
/// Capped at `max_tokens`. The prompt must be non-empty and leave at least
/// one free slot.
#[cfg_attr(not(feature = "llama"), allow(dead_code))]
pub(super) fn generation_budget(
    prompt_tokens: usize,
    context_size: u32,
    max_tokens: u32,
) -> Result<usize, LocalModelError> {
    if prompt_tokens == 0 {
        return Err(LocalModelError::Generation("empty prompt".to_string()));
    }
    let context = context_size as usize;
    if prompt_tokens >= context {
        return Err(LocalModelError::PromptTooLong {
            prompt: prompt_tokens,
            context: context_size,
        });
    }
    Ok((max_tokens as usize).min(context - prompt_tokens))
}
