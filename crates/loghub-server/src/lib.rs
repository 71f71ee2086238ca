//! # loghub-server
//!
//! Central log collection service.
//!
//! Producers open a TCP connection, send one `SUBMIT` document and half-close;
//! the service stores the entry and closes without answering. Viewers send a
//! `QUERY` document the same way and read one response back before the
//! service closes the connection.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   SUBMIT   ┌──────────────────────────────┐
//! │   producer   │───────────►│          LogServer           │
//! └──────────────┘            │  accept loop                 │
//!                             │     │ one task / connection  │
//! ┌──────────────┐   QUERY    │     ▼                        │
//! │    viewer    │◄──────────►│  handle_connection ──► dispatch ──► LogStore
//! └──────────────┘            └──────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use loghub_server::{LogServer, ServerConfig};
//! use loghub_store::MemoryLogStore;
//!
//! # async fn example() -> loghub_server::ServerResult<()> {
//! let config = ServerConfig::default();
//! let server = LogServer::bind(config, Arc::new(MemoryLogStore::new())).await?;
//! let handle = server.handle();
//!
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     handle.shutdown();
//! });
//! server.serve().await
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod server;

// Re-export main types
pub use config::{
    ServerConfig, StoreBackend, StoreConfig, DEFAULT_BIND_ADDR, DEFAULT_DATABASE_URL,
    DEFAULT_MAX_CONNECTIONS, DEFAULT_READ_TIMEOUT_MS,
};
pub use error::{HandlerError, HandlerResult, ServerError, ServerResult};
pub use handler::{dispatch, handle_connection, ConnectionState, HandlerLimits, Outcome, Reply};
pub use server::{LogServer, ServerHandle, ServiceState};
