//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides (`KERNEL_BRIDGE_SERVER__PORT=4000`).
pub const ENV_PREFIX: &str = "KERNEL_BRIDGE_";

/// Project-level config file names, checked in order.
const PROJECT_CONFIG_FILES: [&str; 2] = ["kernel-bridge.toml", ".kernel-bridge.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables prefixed with `KERNEL_BRIDGE_`
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./kernel-bridge.toml` or `./.kernel-bridge.toml`
    /// 4. Global config: `$XDG_CONFIG_HOME/kernel-bridge/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path.map(PathBuf::as_path))
            .extract()
            .map_err(Box::new)
    }

    /// Build the layered figment without extracting it
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/kernel-bridge/config.toml if set,
    /// otherwise falls back to the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("kernel-bridge").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for --show-config)
    pub fn config_sources(config_path: Option<&PathBuf>) -> Vec<(String, bool)> {
        let mut sources = Vec::new();

        if let Some(path) = config_path {
            sources.push((format!("Explicit: {}", path.display()), path.exists()));
        }

        match Self::project_config_path() {
            Some(path) => sources.push((format!("Project: {}", path.display()), true)),
            None => sources.push((
                format!("Project: ./{} or ./{}", PROJECT_CONFIG_FILES[0], PROJECT_CONFIG_FILES[1]),
                false,
            )),
        }

        if let Some(path) = Self::global_config_path() {
            sources.push((format!("Global:  {}", path.display()), path.exists()));
        }

        sources.push((format!("Env:     {}*", ENV_PREFIX), true));
        sources
    }
}
