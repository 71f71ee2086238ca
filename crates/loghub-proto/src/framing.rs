//! Message framing over a byte stream.
//!
//! A frame is the whole payload a peer sends before closing its write half.
//! The reader consumes until end-of-stream and only then decodes, so a
//! payload is never judged complete by how much a single read returned.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtoError, Result};

/// Default upper bound on a single frame: 1MB.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Most entries a single query response carries.
pub const MAX_RESPONSE_ENTRIES: usize = 100;

/// Default upper bound on a query response: a full page of entries, each as
/// large as the biggest request, plus one frame of room for the envelope.
pub const MAX_RESPONSE_SIZE: usize = (MAX_RESPONSE_ENTRIES + 1) * MAX_FRAME_SIZE;

/// Reads one frame: everything until the peer half-closes.
///
/// At most `max_len + 1` bytes are buffered; anything larger is rejected
/// without draining the rest of the stream.
///
/// # Errors
///
/// Returns [`ProtoError::FrameTooLarge`] if the payload exceeds `max_len`,
/// [`ProtoError::EmptyFrame`] if the peer closed without sending anything,
/// or an I/O error from the stream.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let limit = u64::try_from(max_len).unwrap_or(u64::MAX).saturating_add(1);
    let mut buf = Vec::new();
    (&mut *reader).take(limit).read_to_end(&mut buf).await?;

    if buf.len() > max_len {
        return Err(ProtoError::FrameTooLarge { limit: max_len });
    }
    if buf.is_empty() {
        return Err(ProtoError::EmptyFrame);
    }
    Ok(buf)
}

/// Like [`read_frame`], but gives up once `timeout` has elapsed.
///
/// # Errors
///
/// Returns [`ProtoError::Timeout`] if the peer neither finishes nor closes in
/// time, or any error from [`read_frame`].
pub async fn read_frame_with_timeout<R>(
    reader: &mut R,
    max_len: usize,
    timeout: Duration,
) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    tokio::time::timeout(timeout, read_frame(reader, max_len))
        .await
        .map_err(|_| ProtoError::Timeout(timeout))?
}

/// Writes one frame and half-closes the write side to mark its end.
///
/// # Errors
///
/// Returns an I/O error if writing or shutting down fails.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(payload).await?;
    writer.flush().await?;
    writer.shutdown().await?;
    Ok(())
}
