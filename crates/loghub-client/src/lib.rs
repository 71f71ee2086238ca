//! # loghub-client
//!
//! Clients for the loghub log service.
//!
//! - [`LogClient`] sends entries fire-and-forget; delivery failures are
//!   logged and never reach the caller unless it asks via
//!   [`LogClient::try_log`].
//! - [`QueryClient`] fetches the newest matching entries.
//! - [`Simulator`] drives many fake devices for load testing.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::Local;
//! use loghub_client::{LogClient, QueryClient};
//! use loghub_proto::{LogLevel, QueryFilter};
//!
//! # async fn example() -> loghub_client::ClientResult<()> {
//! let logger = LogClient::discover("127.0.0.1:5000").await;
//! logger.log(LogLevel::Error, "disk full", None).await;
//!
//! let today = Local::now().date_naive();
//! let filter = QueryFilter::on(today).with_level(LogLevel::Error);
//! for entry in QueryClient::new("127.0.0.1:5000").query(&filter).await? {
//!     println!("{} {} {}", entry.timestamp, entry.level, entry.message);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod producer;
pub mod query;
pub mod simulate;
pub mod transport;

pub use error::{ClientError, ClientResult};
pub use producer::{default_source, LogClient};
pub use query::QueryClient;
pub use simulate::{SimulationReport, Simulator, SimulatorConfig};
pub use transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_IO_TIMEOUT, DEFAULT_SERVER_ADDR};
