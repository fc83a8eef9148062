//! errorpages: a static site server with configurable error pages.
//!
//! # Architecture Overview
//!
//! ```text
//!   errorpages.toml ──▶ load_config ──▶ ServerConfig
//!                                          │
//!   site.conf ─────────▶ load_site ───────▶ Site { errors layer, startup hooks }
//!                                          │
//!                            startup hooks run (error log opened)
//!                                          │
//!   Client ──▶ listener ──▶ trace ─▶ request id ─▶ errors ─▶ timeout ─▶ ServeDir(root)
//! ```
//!
//! Startup hooks always complete before the listener is bound, so request
//! handling never observes an unopened error log.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use errorpages::config::{load_config, load_site};
use errorpages::lifecycle::signals::spawn_signal_listener;
use errorpages::observability::{logging, metrics};
use errorpages::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "errorpages", version, about = "Static site server with configurable error pages")]
struct Cli {
    /// Path to the server configuration file.
    #[arg(short, long, default_value = "errorpages.toml")]
    config: PathBuf,

    /// Load the configuration and directives, report problems, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability);

    tracing::info!(
        config = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        root = %config.site.root.display(),
        "Configuration loaded"
    );

    let site = load_site(&config.site)?;

    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    // Every hook finishes before the listener exists.
    site.startup.run()?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, site.errors);
    server.run(listener, stop).await?;

    tracing::info!(
        subscribers = shutdown.receiver_count(),
        "Shutdown complete"
    );
    Ok(())
}
