//! Event registration backend.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ rate limit ──▶ registration pipeline
//!                     (cors, ids,      (per IP,       (sanitize, validate)
//!                      headers)         60s window)          │
//!                                                            ▼
//!     Client Response                                  sheets client ──▶ Google Sheets API
//!     ◀────────────── JSON body ◀─────────────────────  (append row)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use event_registration::config;
use event_registration::lifecycle::Shutdown;
use event_registration::observability::{logging, metrics};
use event_registration::HttpServer;

#[derive(Parser)]
#[command(name = "event-registration")]
#[command(about = "Event registration API backed by Google Sheets", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    dotenv::dotenv().ok();

    let config = config::load(cli.config.as_deref())?;
    logging::init_logging(&config.observability, config.is_production());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "event-registration starting"
    );
    tracing::debug!(sheets = ?config.sheets, "Sheets configuration");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
