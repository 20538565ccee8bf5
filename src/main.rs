//! Grayscale image proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client GET /img.png
//!         │
//!         ▼
//!     ┌──────────────┐   race    ┌───────────────────┐   GET    ┌────────┐
//!     │ http handler │─────────▶│ coordinator task  │────────▶│ origin │
//!     │  (deadline)  │◀─────────│ fetch/decode/gray │◀────────│        │
//!     └──────────────┘  oneshot  └───────────────────┘  bytes   └────────┘
//!         │
//!         ▼
//!     encode → 200 image/*      or   408 / 400 / 500 text/plain
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpListener;

use grayscale_proxy::config::{load_config, ObservabilityConfig};
use grayscale_proxy::lifecycle::{wait_for_signal, Shutdown};
use grayscale_proxy::observability::{init_logging, metrics};
use grayscale_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "grayscale-proxy", version)]
#[command(about = "Proxy that returns origin images converted to grayscale", long_about = None)]
struct Cli {
    /// TOML configuration file. APP_HOST, APP_PORT and ORIGIN_SERVER override it.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "grayscale-proxy starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        origin = %config.origin.base(),
        deadline_ms = config.timeouts.deadline_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                    return ExitCode::FAILURE;
                }
            }
            Err(e) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    error = %e,
                    "Failed to parse metrics address"
                );
                return ExitCode::FAILURE;
            }
        }
    }

    let listener = match TcpListener::bind(config.listener.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(
                bind_address = %config.listener.bind_address(),
                error = %e,
                "Failed to bind listener"
            );
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    let server = HttpServer::new(config);
    if let Err(e) = server.run(listener, shutdown.subscribe()).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
