//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

use bridge_application::DispatchParams;
use bridge_application::config::dispatch_params::DEFAULT_READ_BUFFER_SIZE;
use bridge_domain::{BackendKind, DEFAULT_MAX_TOKENS, DEFAULT_SYSTEM_PROMPT, DomainError, SamplingConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("server.host cannot be empty")]
    EmptyHost,

    #[error("remote.base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("remote.model cannot be empty")]
    EmptyRemoteModel,

    #[error("local.model_path cannot be empty when backend.kind = \"local\"")]
    EmptyModelPath,

    #[error("local.context_size cannot be 0")]
    ZeroContextSize,

    #[error("dispatch.read_buffer_size cannot be 0")]
    ZeroReadBufferSize,

    #[error("dispatch: {0}")]
    Dispatch(#[from] DomainError),
}

/// Raw listener configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to bind (0 picks an ephemeral port)
    pub port: u16,
    /// Serve each connection on its own task instead of one at a time
    pub concurrent: bool,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1234,
            concurrent: false,
        }
    }
}

/// Raw dispatch configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    /// System instruction sent with every query
    pub system_prompt: String,
    /// Maximum tokens generated per reply
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub repeat_penalty: Option<f32>,
    /// Upper bound on one backend call, in seconds
    pub timeout_secs: Option<u64>,
    /// Bytes requested per socket read
    pub read_buffer_size: usize,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            top_p: None,
            repeat_penalty: None,
            timeout_secs: None,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl FileDispatchConfig {
    /// Sampling options as the domain type
    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            repeat_penalty: self.repeat_penalty,
        }
    }

    /// Convert into the application-level dispatch parameters
    pub fn to_dispatch_params(&self) -> DispatchParams {
        DispatchParams::default()
            .with_system_prompt(self.system_prompt.clone())
            .with_sampling(self.sampling())
            .with_timeout(self.timeout_secs.map(Duration::from_secs))
            .with_read_buffer_size(self.read_buffer_size)
    }
}

/// Raw backend selection from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Which backend serves this deployment
    pub kind: BackendKind,
}

/// Raw remote (chat-completion API) configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRemoteConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Model identifier sent with each request
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FileRemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Context window presets for the local model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextProfile {
    /// Small window, fast and light
    #[default]
    Light,
    /// Larger window for longer exchanges
    Conversational,
}

impl ContextProfile {
    pub fn context_size(&self) -> u32 {
        match self {
            ContextProfile::Light => 512,
            ContextProfile::Conversational => 2048,
        }
    }
}

/// Raw local model configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLocalConfig {
    /// Path to the model weights (GGUF)
    pub model_path: String,
    /// Context window preset
    pub profile: ContextProfile,
    /// Explicit context window size, overrides `profile`
    pub context_size: Option<u32>,
    /// Inference threads
    pub threads: u32,
}

impl Default for FileLocalConfig {
    fn default() -> Self {
        Self {
            model_path: "SmolLM2-135M-Instruct-Q8_0.gguf".to_string(),
            profile: ContextProfile::default(),
            context_size: None,
            threads: 4,
        }
    }
}

impl FileLocalConfig {
    /// Effective context window size
    pub fn effective_context_size(&self) -> u32 {
        self.context_size
            .unwrap_or_else(|| self.profile.context_size())
    }
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript path
    pub transcript: Option<String>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Listener settings
    pub server: FileServerConfig,
    /// Per-request settings
    pub dispatch: FileDispatchConfig,
    /// Backend selection
    pub backend: FileBackendConfig,
    /// Remote API settings
    pub remote: FileRemoteConfig,
    /// Local model settings
    pub local: FileLocalConfig,
    /// Logging settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigValidationError::EmptyHost);
        }

        if let Some(0) = self.dispatch.timeout_secs {
            return Err(ConfigValidationError::ZeroTimeout("dispatch.timeout_secs"));
        }
        if self.dispatch.read_buffer_size == 0 {
            return Err(ConfigValidationError::ZeroReadBufferSize);
        }
        self.dispatch.to_dispatch_params().validate()?;

        match self.backend.kind {
            BackendKind::Remote => {
                if self.remote.base_url.trim().is_empty() {
                    return Err(ConfigValidationError::EmptyBaseUrl);
                }
                if self.remote.model.trim().is_empty() {
                    return Err(ConfigValidationError::EmptyRemoteModel);
                }
                if self.remote.timeout_secs == 0 {
                    return Err(ConfigValidationError::ZeroTimeout("remote.timeout_secs"));
                }
            }
            BackendKind::Local => {
                if self.local.model_path.trim().is_empty() {
                    return Err(ConfigValidationError::EmptyModelPath);
                }
                if self.local.effective_context_size() == 0 {
                    return Err(ConfigValidationError::ZeroContextSize);
                }
            }
        }

        Ok(())
    }
}
