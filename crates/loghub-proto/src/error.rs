//! Error types for the loghub-proto crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while encoding, decoding or framing messages.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode a message.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a message.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The peer closed the connection without sending anything.
    #[error("empty frame")]
    EmptyFrame,

    /// The frame exceeded the configured maximum size.
    #[error("frame exceeds {limit} bytes")]
    FrameTooLarge {
        /// Maximum permitted size in bytes.
        limit: usize,
    },

    /// The peer did not finish sending within the allotted time.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// An I/O error occurred on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtoError {
    /// Returns true if the error stems from the payload itself rather than the transport.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Decoding(_) | Self::EmptyFrame | Self::FrameTooLarge { .. })
    }
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;
