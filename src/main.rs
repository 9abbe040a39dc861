//! Alias dispatcher.
//!
//! Serves an application behind public URL aliases.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │               ALIAS DISPATCHER                │
//!                         │                                               │
//!     Client Request      │  ┌─────────┐   ┌──────────┐   ┌────────────┐  │
//!     ────────────────────┼─▶│  http   │──▶│ dispatch │──▶│  routing   │  │
//!                         │  │ server  │   │   path   │   │AliasRouter │  │
//!                         │  └─────────┘   └──────────┘   └─────┬──────┘  │
//!                         │       ▲                             │         │
//!     301 canonical alias │       │        ┌────────────┐       ▼         │
//!     ◀───────────────────┼───────┴────────│ Dispatcher │◀── route        │
//!     or application      │                └────────────┘                 │
//!     response            │                                               │
//!                         │  ┌─────────┐ ┌────────┐ ┌───────┐ ┌─────────┐ │
//!                         │  │ config  │ │ store  │ │ admin │ │lifecycle│ │
//!                         │  └─────────┘ └────────┘ └───────┘ └─────────┘ │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use alias_dispatch::config::watcher::ConfigWatcher;
use alias_dispatch::config::{load_config, AppConfig};
use alias_dispatch::observability::{logging, metrics};
use alias_dispatch::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "alias-dispatch", version, about = "Alias dispatcher")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "alias-dispatch starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        bindings = config.router.bindings.len(),
        cache_file = ?config.router.cache_file,
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

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown.clone().trigger_on_signal());

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
