//! CLI entry point for panerelay.

mod cli;

use clap::Parser;
use panerelay::build_info::startup_metadata_line;
use panerelay::config::{load_config_with_diagnostics, Config};
use panerelay::delivery::HttpDispatcher;
use panerelay::engine::Engine;
use panerelay::error::RelayError;
use panerelay::registry::{FileRegistry, SessionRegistry};
use panerelay::tmux::TmuxClient;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "panerelay failed to start");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: cli::Args) -> Result<(), RelayError> {
    let loaded = load_config_with_diagnostics(args.config.as_deref())?;
    for warning in &loaded.diagnostics.deprecations {
        tracing::warn!("{warning}");
    }
    let mut config = loaded.config;
    config.apply_overrides(&args.overrides());

    tracing::info!(
        version = %startup_metadata_line(),
        config = %loaded
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string()),
        registry = %config.registry.path.display(),
        "starting panerelay"
    );

    let registry = Arc::new(FileRegistry::new(config.registry.path.clone()));
    // A malformed registry at startup is an operator error; later refresh
    // failures only keep the previous session set.
    let initial = registry.load().await?;
    tracing::info!(sessions = initial.len(), "registry loaded");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut engine = build_engine(&config, registry, shutdown_rx)?;

    if args.once {
        let report = engine.tick().await;
        tracing::info!(?report, "single tick finished");
        return Ok(());
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
        }
        let _ = shutdown_tx.send(true);
    });
    engine.run().await;
    Ok(())
}

fn build_engine(
    config: &Config,
    registry: Arc<FileRegistry>,
    shutdown: watch::Receiver<bool>,
) -> Result<Engine, RelayError> {
    let settings = config.engine_settings()?;
    let terminal = Arc::new(TmuxClient::new(config.tmux.socket.clone()));
    let sink = Arc::new(HttpDispatcher::new(
        config.delivery_timeout(),
        config.retry_policy(),
        &config.delivery.reply_path,
    ));
    Ok(Engine::new(settings, terminal, sink, registry, shutdown))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "panerelay=debug" } else { "panerelay=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
