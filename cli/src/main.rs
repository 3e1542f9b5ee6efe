//! CLI entrypoint for kernel-bridge
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use bridge_application::{ServeSessionUseCase, TranscriptLogger};
use bridge_infrastructure::{
    AcceptorSettings, ConfigLoader, ConnectionAcceptor, FileConfig, JsonlTranscriptLogger,
    build_backend,
};
use bridge_presentation::{Cli, ConsoleFormatter, StartupInfo};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "kernel-bridge.log";

#[tokio::main]
async fn main() -> Result<()> {
    // Before anything reads the environment (API key, KERNEL_BRIDGE_*).
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(&cli)?;

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Could not read .env: {}", e),
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    apply_cli_overrides(&mut config, &cli);

    if cli.show_config {
        if !cli.no_config {
            print!(
                "{}",
                ConsoleFormatter::config_sources(&ConfigLoader::config_sources(cli.config.as_ref()))
            );
        }
        let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
        println!("{}", ConsoleFormatter::effective_config(&rendered));
        return Ok(());
    }

    config.validate().context("Invalid configuration")?;

    info!("Starting kernel-bridge");

    // === Dependency Injection ===
    let backend = build_backend(&config).context("Failed to initialize backend")?;

    let mut use_case = ServeSessionUseCase::new(backend.clone(), config.dispatch.to_dispatch_params());
    let transcript_path = config.logging.transcript.clone();
    if let Some(path) = &transcript_path {
        match JsonlTranscriptLogger::new(path) {
            Some(logger) => {
                info!(path = %logger.path().display(), "Writing transcript");
                let logger: Arc<dyn TranscriptLogger> = Arc::new(logger);
                use_case = use_case.with_transcript_logger(logger);
            }
            None => warn!("Transcript disabled: could not open {}", path),
        }
    }

    let settings = AcceptorSettings::new(config.server.host.clone(), config.server.port)
        .with_concurrent(config.server.concurrent);
    let acceptor = ConnectionAcceptor::bind(&settings, use_case)
        .await
        .context("Failed to start listener")?;

    let listen = acceptor
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| format!("{}:{}", settings.host, settings.port));

    if !cli.quiet {
        println!(
            "{}",
            ConsoleFormatter::banner(&StartupInfo {
                listen,
                backend_kind: backend.kind(),
                backend: backend.describe(),
                concurrent: settings.concurrent,
                transcript: transcript_path,
            })
        );
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            signal.cancel();
        }
    });

    acceptor.run(shutdown).await.context("Bridge stopped")?;

    info!("kernel-bridge stopped");
    Ok(())
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over the `-v` count. With `--log-dir`, records also go
/// to a daily-rotated file; the returned guard flushes it on exit.
fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Command-line flags override every configuration source.
fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(kind) = cli.backend {
        config.backend.kind = kind;
    }
    if cli.concurrent {
        config.server.concurrent = true;
    }
    if let Some(path) = &cli.transcript {
        config.logging.transcript = Some(path.display().to_string());
    }
}
