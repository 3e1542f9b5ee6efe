//! CLI command definitions

use bridge_domain::BackendKind;
use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for kernel-bridge
#[derive(Parser, Debug)]
#[command(name = "kernel-bridge")]
#[command(author, version, about = "TCP bridge between a kernel console and an LLM backend")]
#[command(long_about = r#"
kernel-bridge listens for a kernel's console stream over TCP. Whenever the
stream contains a line of the form

    AI_REQ: <question>

the question is sent to the configured backend (a hosted OpenAI-compatible
API or a local GGUF model) and a single-line answer is written back.

Configuration files are loaded from (in priority order):
1. KERNEL_BRIDGE_* environment variables (e.g. KERNEL_BRIDGE_SERVER__PORT)
2. --config <path>        Explicit config file
3. ./kernel-bridge.toml   Project-level config
4. ~/.config/kernel-bridge/config.toml   Global config

Command-line flags override all of the above. A .env file in the working
directory is loaded first (for GROQ_API_KEY and friends).

Example:
  kernel-bridge
  kernel-bridge --backend local --port 4444 -v
  kernel-bridge --transcript bridge.jsonl --log-dir logs
"#)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Backend answering requests (local, remote)
    #[arg(short, long, value_name = "KIND")]
    pub backend: Option<BackendKind>,

    /// Serve several kernel connections at once
    #[arg(long)]
    pub concurrent: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace incl. console echo)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the startup banner
    #[arg(short, long)]
    pub quiet: bool,

    /// Write a daily-rotated log file into this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Append a JSONL transcript of requests and replies to this file
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration sources and the effective configuration, then exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Log filter directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
