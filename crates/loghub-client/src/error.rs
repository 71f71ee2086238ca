//! Client error types.

use std::time::Duration;

use loghub_proto::ProtoError;
use thiserror::Error;

/// Errors returned by the loghub clients and the `loghub` tool.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service could not be reached.
    #[error("failed to connect to {addr}: {source}")]
    Connection {
        /// Address that was dialed.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// Connecting, sending or waiting for the response took too long.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The service closed the connection without answering.
    #[error("no response from server")]
    NoResponse,

    /// The service answered a query with `status: ERROR`.
    #[error("server could not complete the query")]
    Rejected,

    /// A request could not be encoded or a response decoded.
    #[error("protocol error: {0}")]
    Proto(ProtoError),

    /// A command-line argument was not usable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output could not be rendered.
    #[error("format error: {0}")]
    Format(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProtoError> for ClientError {
    fn from(err: ProtoError) -> Self {
        match err {
            ProtoError::EmptyFrame => Self::NoResponse,
            ProtoError::Timeout(after) => Self::Timeout(after),
            ProtoError::Io(e) => Self::Io(e),
            other => Self::Proto(other),
        }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;
