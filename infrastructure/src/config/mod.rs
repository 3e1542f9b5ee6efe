//! Configuration file loading for kernel-bridge
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `KERNEL_BRIDGE_*` environment variables (`__` separates nested keys)
//! 2. `--config <path>` specified file
//! 3. Project root: `./kernel-bridge.toml` or `./.kernel-bridge.toml`
//! 4. Global: `$XDG_CONFIG_HOME/kernel-bridge/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, ContextProfile, FileBackendConfig, FileConfig, FileDispatchConfig,
    FileLocalConfig, FileLoggingConfig, FileRemoteConfig, FileServerConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
