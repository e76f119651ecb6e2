mod api;
pub mod config;
pub mod state;

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};

use telemetry_core::{Registry, DEFAULT_CONFIG_PATH};

use crate::config::Settings;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "telemetry-server", about = "Device telemetry ingestion server")]
struct Args {
    /// HTTP port [default: 8080]
    #[arg(short, long, env = "TELEMETRY_PORT")]
    port: Option<u16>,

    /// Path to the devices CSV (header row, device id in the first column) [default: devices.csv]
    #[arg(long, env = "TELEMETRY_CSV")]
    csv: Option<String>,

    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "TELEMETRY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let file_config = config::load_optional(&args.config)
        .with_context(|| format!("Failed to load config file {}", args.config))?;
    let settings = Settings::resolve(args.port, args.csv, file_config);

    info!(port = settings.port, csv = %settings.csv_path, "Telemetry server starting");

    // A failed load is fatal: never serve with a partial registry.
    let registry = Registry::new();
    let count = registry
        .load_file(&settings.csv_path)
        .await
        .with_context(|| format!("Failed to load devices from {}", settings.csv_path))?;
    info!(devices = count, "Device registry ready");
    if registry.is_empty().await {
        warn!(csv = %settings.csv_path, "Bootstrap file lists no devices, every request will 404");
    }
    debug!(devices = ?registry.device_ids().await, "Registered device ids");

    let state = AppState::new(registry);
    let app = api::build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(uptime_secs = state.uptime_secs(), "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl-C handler, running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
