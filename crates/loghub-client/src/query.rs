//! Query client.

use std::time::Duration;

use loghub_proto::{
    read_frame_with_timeout, write_frame, LogEntry, QueryFilter, QueryResponse, Request,
    ResponseStatus, MAX_RESPONSE_SIZE,
};
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::transport::{connect, DEFAULT_CONNECT_TIMEOUT, DEFAULT_IO_TIMEOUT};

/// Client that fetches entries from the log service.
#[derive(Debug, Clone)]
pub struct QueryClient {
    addr: String,
    connect_timeout: Duration,
    response_timeout: Duration,
    max_response_size: usize,
}

impl QueryClient {
    /// Creates a client for the service at `addr` (`host:port`).
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            response_timeout: DEFAULT_IO_TIMEOUT,
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the time allowed for sending the request and reading the whole
    /// response.
    #[must_use]
    pub const fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Sets the largest response accepted.
    #[must_use]
    pub const fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    /// Address of the service.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Fetches up to 100 entries matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NoResponse`] if the service closes without answering
    ///   (it drops requests it cannot decode)
    /// - [`ClientError::Rejected`] if the service reports a failed query
    /// - [`ClientError::Connection`] or [`ClientError::Timeout`] when the
    ///   service is unreachable or slow
    pub async fn query(&self, filter: &QueryFilter) -> ClientResult<Vec<LogEntry>> {
        let payload = Request::query(filter.clone()).to_bytes()?;
        let mut stream = connect(&self.addr, self.connect_timeout).await?;

        timeout(self.response_timeout, write_frame(&mut stream, &payload))
            .await
            .map_err(|_| ClientError::Timeout(self.response_timeout))??;

        let body =
            read_frame_with_timeout(&mut stream, self.max_response_size, self.response_timeout)
                .await?;
        let response = QueryResponse::from_bytes(&body)?;

        match response.status {
            ResponseStatus::Ok => {
                debug!(addr = %self.addr, entries = response.entries.len(), "Query answered");
                Ok(response.entries)
            }
            ResponseStatus::Error => Err(ClientError::Rejected),
        }
    }
}
