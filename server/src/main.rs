//! `menage-server` entry point.
//!
//! Loads `.env`, then `menage.toml` (or `--config`), opens the SQLite store
//! and upload tree, and serves the checklist until Ctrl-C.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use menage_intake::IntakeConfig;
use menage_server::{AppState, router};
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "menage-server", version, about = "Cleaning checklist intake service")]
struct Cli {
    /// Path to the TOML config file (defaults to $MENAGE_CONFIG or ./menage.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind, overriding config and environment
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env"),
    }

    tracing::info!("menage-server v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = IntakeConfig::load(cli.config.as_deref()).context("loading config")?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    let state = AppState::from_config(menage_checklist::get_schema(), &config)
        .context("opening storage")?;
    let app = router(state, config.max_body_bytes);

    let listener = TcpListener::bind(config.bind.as_str())
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    tracing::info!("menage-server exiting cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("Signal received, shutting down");
}
