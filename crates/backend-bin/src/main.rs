use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backend_lib::{
    config::{Settings, StorageBackend},
    router, telemetry,
    storage::{FlatFileUserStore, MemoryUserStore, UserStore},
    AppState,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

/// `StreamHub` account API server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Extra configuration file layered over `config/default.toml`
    #[arg(long, env = "STREAMHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load configuration")?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    settings.validate().context("invalid configuration")?;

    telemetry::init(&settings.log)?;

    let store: Arc<dyn UserStore> = match settings.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryUserStore::new()),
        StorageBackend::FlatFile => Arc::new(
            FlatFileUserStore::new(&settings.storage.path)
                .context("failed to open user store")?,
        ),
    };
    info!(backend = ?settings.storage.backend, "user store ready");

    let addr = settings.bind_addr()?;
    let state = AppState::new(store, settings)?;
    let app = router::create_router(state)?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
