//! Dialing the log service.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use crate::error::{ClientError, ClientResult};

/// Default time allowed to establish a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default time allowed to send a request or receive a response.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(3);

/// Default service address.
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:5000";

/// Opens a fresh connection; every exchange uses its own.
pub(crate) async fn connect(addr: &str, connect_timeout: Duration) -> ClientResult<TcpStream> {
    trace!(addr, "Connecting");
    match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(ClientError::Connection {
            addr: addr.to_string(),
            source,
        }),
        Err(_) => Err(ClientError::Timeout(connect_timeout)),
    }
}
