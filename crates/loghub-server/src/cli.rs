//! Command-line arguments of the `loghubd` binary.
//!
//! Flags override the JSON config file, which overrides built-in defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{ServerConfig, StoreBackend};
use crate::error::ServerResult;

/// loghubd - central log collection service.
#[derive(Parser, Debug, Clone)]
#[command(name = "loghubd")]
#[command(version, about, long_about = None)]
pub struct ServerArgs {
    /// Path to a JSON config file.
    #[arg(short, long, env = "LOGHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(short, long, env = "LOGHUB_ADDR")]
    pub addr: Option<SocketAddr>,

    /// SQLite database URL.
    #[arg(long, env = "LOGHUB_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Storage backend.
    #[arg(long, value_enum)]
    pub store: Option<StoreBackend>,

    /// Time a client gets to send its whole request, in milliseconds.
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    /// Time a client gets to take its whole response, in milliseconds.
    #[arg(long)]
    pub write_timeout_ms: Option<u64>,

    /// Maximum number of connections handled at once.
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Output format of the service's own logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl ServerArgs {
    /// Builds the effective configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the result is
    /// invalid.
    pub fn into_config(self) -> ServerResult<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(addr) = self.addr {
            config.bind_addr = addr;
        }
        if let Some(url) = self.database_url {
            config.store.database_url = url;
        }
        if let Some(backend) = self.store {
            config.store.backend = backend;
        }
        if let Some(ms) = self.read_timeout_ms {
            config.read_timeout_ms = ms;
        }
        if let Some(ms) = self.write_timeout_ms {
            config.write_timeout_ms = ms;
        }
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }

        config.validate()?;
        Ok(config)
    }
}
