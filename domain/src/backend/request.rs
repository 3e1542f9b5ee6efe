//! Backend request

use super::sampling::SamplingConfig;
use crate::protocol::request::Request;

/// System instruction used when the deployment does not configure one.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are JC-AI running inside a custom Rust kernel. Be extremely concise, max 15 words.";

/// Everything a backend needs to answer one query.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    /// Fixed per deployment.
    pub system_prompt: String,
    /// The trimmed query extracted from the client stream.
    pub query: String,
    pub sampling: SamplingConfig,
}

impl BackendRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        request: &Request,
        sampling: SamplingConfig,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            query: request.query().to_string(),
            sampling,
        }
    }
}
