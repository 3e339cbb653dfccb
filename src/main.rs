//! `caltrain-gateway` binary: load config, start the server, stop on a signal.

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use caltrain_gateway::config::load_gateway_config;
use caltrain_gateway::lifecycle::{wait_for_signal, Shutdown};
use caltrain_gateway::observability::{logging, metrics};
use caltrain_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "caltrain-gateway", version, about = "Caching gateway for the 511 transit API")]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_gateway_config(cli.config.as_deref(), cli.bind) {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from this file, so report plainly.
            eprintln!("caltrain-gateway: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "caltrain-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        credentials = config.credentials.keys.len(),
        cache_ttl_secs = config.cache.ttl_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
