//! loghubd - central log collection service.
//!
//! Accepts `SUBMIT` and `QUERY` requests over TCP and keeps entries in a
//! SQLite database.

use anyhow::Context;
use clap::Parser;
use loghub_server::cli::{LogFormat, ServerArgs};
use loghub_server::LogServer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match args.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }

    let config = args.into_config().context("invalid configuration")?;

    info!(
        addr = %config.bind_addr,
        store = ?config.store.backend,
        database = %config.store.database_url,
        "Starting loghubd"
    );

    let store = config.store.open().await.context("failed to open log store")?;
    let server = LogServer::bind(config, store).await?;

    let handle = server.handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                handle.shutdown();
            }
            Err(e) => error!(error = %e, "Failed to listen for interrupt"),
        }
    });

    server.serve().await?;
    Ok(())
}
