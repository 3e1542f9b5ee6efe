//! Dispatch parameters: per-deployment backend call settings.
//!
//! [`DispatchParams`] groups the static values used by
//! [`ServeSessionUseCase`](crate::use_cases::serve_session::ServeSessionUseCase)
//! for every request: the system instruction, sampling options, the optional
//! dispatch timeout and the socket read size.

use bridge_domain::{DEFAULT_SYSTEM_PROMPT, DomainError, SamplingConfig};
use std::time::Duration;

/// Bytes requested per socket read.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone)]
pub struct DispatchParams {
    /// System instruction sent with every query.
    pub system_prompt: String,
    /// Sampling options forwarded to the backend.
    pub sampling: SamplingConfig,
    /// Upper bound on one backend call. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Size of each socket read.
    pub read_buffer_size: usize,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            sampling: SamplingConfig::default(),
            timeout: None,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl DispatchParams {
    // ==================== Builder Methods ====================

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Check the parameters against domain rules.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.system_prompt.trim().is_empty() {
            return Err(DomainError::EmptySystemPrompt);
        }
        self.sampling.validate()
    }
}
