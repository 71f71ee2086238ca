//! Error types for the log service.

use std::net::SocketAddr;
use std::time::Duration;

use loghub_proto::ProtoError;
use loghub_store::StoreError;
use thiserror::Error;

/// Errors that can stop or prevent the service.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The store could not be opened.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Reasons a single connection ends without completing its exchange.
///
/// None of these reach the client: the connection is simply closed.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The client did not finish its request in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request exceeded the size limit.
    #[error("request exceeds {0} bytes")]
    FrameTooLarge(usize),

    /// The request was empty, not a valid document, or missed required fields.
    #[error("malformed request: {0}")]
    Decode(String),

    /// The response could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(String),

    /// The store failed a `SUBMIT` insert.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The connection failed while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProtoError> for HandlerError {
    fn from(err: ProtoError) -> Self {
        match err {
            ProtoError::Timeout(after) => Self::Timeout(after),
            ProtoError::FrameTooLarge { limit } => Self::FrameTooLarge(limit),
            ProtoError::Io(e) => Self::Io(e),
            ProtoError::Encoding(msg) => Self::Encode(msg),
            ProtoError::Decoding(msg) => Self::Decode(msg),
            ProtoError::EmptyFrame => Self::Decode("empty request".to_string()),
        }
    }
}

/// Result type for connection handling.
pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_bind_failed_error_display() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 5000);
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err = ServerError::BindFailed(addr, io_err);

        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:5000"));
        assert!(msg.contains("address in use"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ServerError::Config("max_connections must be positive".to_string());
        assert_eq!(err.to_string(), "configuration error: max_connections must be positive");
    }

    #[test]
    fn test_proto_errors_map_to_handler_errors() {
        let err = HandlerError::from(ProtoError::Timeout(Duration::from_secs(2)));
        assert!(matches!(err, HandlerError::Timeout(d) if d == Duration::from_secs(2)));

        let err = HandlerError::from(ProtoError::FrameTooLarge { limit: 10 });
        assert!(matches!(err, HandlerError::FrameTooLarge(10)));

        let err = HandlerError::from(ProtoError::EmptyFrame);
        assert!(matches!(err, HandlerError::Decode(_)));

        let err = HandlerError::from(ProtoError::Decoding("bad".to_string()));
        assert_eq!(err.to_string(), "malformed request: bad");
    }

    #[test]
    fn test_store_error_conversion() {
        let err: HandlerError = StoreError::Unavailable("down".to_string()).into();
        assert!(matches!(err, HandlerError::Store(_)));
    }
}
