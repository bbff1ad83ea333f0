//! graceful-http demo server.
//!
//! Serves a small axum router with the configured timeouts and shuts down
//! gracefully on SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::{routing::get, Router};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use graceful_http::config::{load_config, FileConfig};
use graceful_http::lifecycle::{cancel_on_signal, Server};
use graceful_http::net::tls::load_tls_config;
use graceful_http::observability::{logging, metrics, TracingLog};
use graceful_http::{ServerConfig, ServerOption};

#[derive(Parser)]
#[command(name = "graceful-http")]
#[command(about = "HTTP server with bounded graceful shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    address: Option<String>,

    /// Override the shutdown timeout in milliseconds.
    #[arg(long, allow_negative_numbers = true)]
    shutdown_timeout_ms: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut file = match &cli.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };
    if let Some(address) = cli.address {
        file.listener.bind_address = address;
    }
    if let Some(ms) = cli.shutdown_timeout_ms {
        file.timeouts.shutdown_ms = ms;
    }

    logging::init_tracing(&file.observability.log_filter);
    tracing::info!("graceful-http v{} starting", env!("CARGO_PKG_VERSION"));

    if file.observability.metrics_enabled {
        match file.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %file.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut options = file.options();
    options.push(ServerOption::ErrorLog(std::sync::Arc::new(TracingLog)));
    if let Some(tls) = &file.tls {
        let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
        options.push(ServerOption::Tls(rustls));
    }

    let config = ServerConfig::new(file.listener.bind_address.clone(), app(), options);
    tracing::info!(
        bind_address = %config.address(),
        shutdown_timeout = ?config.shutdown_timeout(),
        "Configuration loaded"
    );

    let token = CancellationToken::new();
    cancel_on_signal(token.clone());

    Server::new(config).run(token).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn app() -> Router {
    Router::new()
        .route("/", get(|| async { "Hello from graceful-http" }))
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "done"
            }),
        )
}
