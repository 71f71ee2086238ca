//! Fire-and-forget producer client.
//!
//! [`LogClient`] is a plain value: build one per process (or per device) and
//! clone it into every task that logs. Each entry travels on its own
//! connection, and the service never answers a `SUBMIT`.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use loghub_proto::{write_frame, LogEntry, LogLevel, Request};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::transport::{connect, DEFAULT_CONNECT_TIMEOUT, DEFAULT_IO_TIMEOUT};

/// Producer client for the log service.
#[derive(Debug, Clone)]
pub struct LogClient {
    addr: String,
    source: String,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl LogClient {
    /// Creates a client for the service at `addr` (`host:port`).
    ///
    /// No name lookup happens here: entries are attributed to
    /// `"<hostname> (127.0.0.1)"` unless overridden. Use
    /// [`discover`](Self::discover) to attribute them to the resolved address.
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            source: host_source(&local_hostname(), Ipv4Addr::LOCALHOST),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Creates a client whose entries are attributed to [`default_source`].
    pub async fn discover(addr: impl Into<String>) -> Self {
        Self::new(addr).with_source(default_source().await)
    }

    /// Sets the source used when a call does not name one.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the time allowed to send one entry.
    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Address of the service.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Default source of this client.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Sends one entry, stamped now. Delivery failures are logged and the
    /// entry is discarded.
    pub async fn log(&self, level: impl Into<LogLevel>, message: impl Into<String>, source: Option<&str>) {
        if let Err(e) = self.try_log(level, message, source).await {
            warn!(addr = %self.addr, error = %e, "Failed to deliver log entry");
        }
    }

    /// Like [`log`](Self::log), but reports delivery failures. Returns the
    /// entry as it was sent.
    ///
    /// Success means the entry was handed to the service, not that it was
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached in time or the
    /// connection fails while sending.
    pub async fn try_log(
        &self,
        level: impl Into<LogLevel>,
        message: impl Into<String>,
        source: Option<&str>,
    ) -> ClientResult<LogEntry> {
        let entry = LogEntry::new(level, message, source.unwrap_or(&self.source));
        self.submit(&entry).await?;
        Ok(entry)
    }

    /// Sends a fully built entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached in time or the
    /// connection fails while sending.
    pub async fn submit(&self, entry: &LogEntry) -> ClientResult<()> {
        let payload = Request::submit(entry.clone()).to_bytes()?;
        let mut stream = connect(&self.addr, self.connect_timeout).await?;

        timeout(self.write_timeout, write_frame(&mut stream, &payload))
            .await
            .map_err(|_| ClientError::Timeout(self.write_timeout))??;

        debug!(addr = %self.addr, level = %entry.level, "Log entry sent");
        Ok(())
    }
}

/// `"<hostname> (<ipv4>)"` for this machine.
///
/// The address is the first IPv4 address the hostname resolves to, or
/// `127.0.0.1` when it does not resolve.
pub async fn default_source() -> String {
    let host = local_hostname();
    let ip = resolve_ipv4(&host).await.unwrap_or(Ipv4Addr::LOCALHOST);
    host_source(&host, ip)
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "localhost".to_string())
}

fn host_source(host: &str, ip: Ipv4Addr) -> String {
    format!("{host} ({ip})")
}

async fn resolve_ipv4(host: &str) -> Option<Ipv4Addr> {
    tokio::net::lookup_host((host, 0))
        .await
        .ok()?
        .find_map(|addr| match addr.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
}
