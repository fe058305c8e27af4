//! tempvoice - temporary voice channel manager.
//!
//! Loads configuration once, connects to Discord, and runs until SIGINT or
//! SIGTERM.

use anyhow::Context as _;
use std::sync::Arc;
use tempvoice::config::{self, Config};
use tempvoice::gateway::discord;
use tempvoice::state::Lifecycle;
use tokio::sync::broadcast;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = config::resolve_path(
        std::env::args().skip(1),
        std::env::var("CONFIG_PATH").ok(),
    );
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;
    config.apply_token_override(std::env::var("BOT_TOKEN").ok());

    // Initialize tracing
    tempvoice::telemetry::init_tracing(config.log.format);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(path = %config_path, error = %e, "Invalid configuration");
        }
        anyhow::bail!("refusing to start with {} configuration error(s)", errors.len());
    }

    let core = config.core();
    info!(
        lobby = %core.lobby_channel_id,
        parent = %core.temp_parent_id,
        max_per_guild = core.max_channels_per_guild,
        "Starting tempvoice"
    );

    // Shutdown signal for the sweeper, metrics server and Discord shards.
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    // Prometheus metrics are optional; port 0 disables the endpoint.
    if config.metrics.port == 0 {
        info!("Metrics disabled");
    } else {
        tempvoice::metrics::init();
        tokio::spawn(tempvoice::http::run_http_server(
            config.metrics.port,
            shutdown_tx.subscribe(),
        ));
        info!(port = config.metrics.port, "Metrics initialized");
    }

    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("Received shutdown signal, closing session");
            let _ = shutdown_tx.send(());
        });
    }

    let lifecycle = Arc::new(Lifecycle::new(core.max_channels_per_guild));
    discord::run(&config.discord.token, lifecycle, core, shutdown_tx)
        .await
        .context("Discord session failed")?;

    info!("tempvoice stopped");
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
