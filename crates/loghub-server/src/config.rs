//! Server configuration.
//!
//! A [`ServerConfig`] can be built in code, loaded from a JSON file, or
//! assembled by the `loghubd` command line (see [`crate::cli`]).

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use loghub_proto::MAX_FRAME_SIZE;
use loghub_store::{MemoryLogStore, SharedLogStore, SqliteLogStore};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Default listen address.
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 5000);

/// Default time a client gets to deliver its whole request: 10s.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10_000;

/// Default time a client gets to take the whole response: 10s.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 10_000;

/// Default maximum number of connections handled at once.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1000;

/// Default database location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://loghub.db";

/// Which [`loghub_store::LogStore`] implementation backs the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite database at [`StoreConfig::database_url`].
    #[default]
    Sqlite,
    /// Process memory; entries are lost on restart.
    Memory,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store implementation.
    pub backend: StoreBackend,
    /// SQLite database URL.
    pub database_url: String,
    /// Size of the SQLite connection pool.
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: loghub_store::sqlite::DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl StoreConfig {
    /// Opens the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(&self) -> ServerResult<SharedLogStore> {
        let store: SharedLogStore = match self.backend {
            StoreBackend::Memory => Arc::new(MemoryLogStore::new()),
            StoreBackend::Sqlite => {
                Arc::new(SqliteLogStore::connect(&self.database_url, self.max_connections).await?)
            }
        };
        Ok(store)
    }
}

/// Configuration for the log service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the listener to.
    pub bind_addr: SocketAddr,
    /// Time allowed for a client to send its full request, in milliseconds.
    pub read_timeout_ms: u64,
    /// Time allowed for a client to take the full response, in milliseconds.
    pub write_timeout_ms: u64,
    /// Largest accepted request in bytes.
    pub max_frame_size: usize,
    /// Maximum number of connections handled at once; extra ones are dropped.
    pub max_connections: usize,
    /// Storage settings.
    pub store: StoreConfig,
}

impl ServerConfig {
    /// Create a new server configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            max_frame_size: MAX_FRAME_SIZE,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            store: StoreConfig::default(),
        }
    }

    /// Set the read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the maximum request size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the maximum number of concurrent connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the storage settings.
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Get the read timeout.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Get the write timeout.
    #[must_use]
    pub const fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Load configuration from a JSON file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("failed to read config file '{}': {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or fails validation.
    pub fn from_json(content: &str) -> ServerResult<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ServerError::Config(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any limit is zero or the database URL is empty.
    pub fn validate(&self) -> ServerResult<()> {
        if self.read_timeout_ms == 0 {
            return Err(ServerError::Config("read_timeout_ms must be positive".to_string()));
        }
        if self.write_timeout_ms == 0 {
            return Err(ServerError::Config("write_timeout_ms must be positive".to_string()));
        }
        if self.max_frame_size == 0 {
            return Err(ServerError::Config("max_frame_size must be positive".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ServerError::Config("max_connections must be positive".to_string()));
        }
        if self.store.backend == StoreBackend::Sqlite && self.store.database_url.is_empty() {
            return Err(ServerError::Config("database_url cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BIND_ADDR)
    }
}
