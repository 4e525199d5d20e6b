//! Streaming a multipart file body into a sink.
//!
//! The part headers are still line oriented and are read through the connection's
//! [`LineBuffer`]. Once the blank line is seen the body is binary, so the bytes left in
//! the line buffer are taken over and further chunks are read straight from the socket.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::http::buffer::LineBuffer;
use crate::http::error::ParseError;
use crate::http::multipart::{Boundary, fill_skippable_line};

/// Bytes requested from the socket per body read.
const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Skipping the part headers that follow the filename line
    Headers,
    /// Copying body bytes until the closing marker
    Body,
}

/// Copies the file body to `sink` until the closing boundary marker.
///
/// Expects `buffer` to sit just after the part's filename line. Returns the number of body
/// bytes written; the marker itself is never written. Bytes that might be the start of a
/// marker split across two reads are held back until the next read settles it.
pub async fn stream_body<R, W>(
    buffer: &mut LineBuffer,
    reader: &mut R,
    boundary: &Boundary,
    sink: &mut W,
) -> Result<u64, ParseError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut mode = Mode::Headers;
    while mode == Mode::Headers {
        fill_skippable_line(buffer, reader).await?;
        if buffer.next_line().is_some_and(|line| line.is_empty()) {
            mode = Mode::Body;
        }
        buffer.consume_line();
    }

    let marker = boundary.closing_marker();
    let keep = marker.len() - 1;

    let mut pending = BytesMut::with_capacity(CHUNK_SIZE + marker.len());
    pending.extend_from_slice(&buffer.take_resident());
    let mut written: u64 = 0;

    loop {
        if let Some(end) = find_marker(&pending, &marker) {
            write_to_sink(sink, &pending[..end]).await?;
            sink.flush().await.map_err(ParseError::sink)?;
            written += end as u64;
            trace!(written, "found closing boundary");
            return Ok(written);
        }

        let flushable = pending.len().saturating_sub(keep);
        if flushable > 0 {
            write_to_sink(sink, &pending[..flushable]).await?;
            pending.advance(flushable);
            written += flushable as u64;
        }

        pending.reserve(CHUNK_SIZE);
        let n = reader.read_buf(&mut pending).await?;
        if n == 0 {
            return Err(ParseError::Closed);
        }
        trace!(read = n, held = pending.len(), "read body chunk");
    }
}

/// Position of `marker` in `haystack`, comparing raw bytes.
pub fn find_marker(haystack: &[u8], marker: &[u8]) -> Option<usize> {
    if marker.is_empty() || haystack.len() < marker.len() {
        return None;
    }
    haystack.windows(marker.len()).position(|w| w == marker)
}

async fn write_to_sink<W>(sink: &mut W, bytes: &[u8]) -> Result<(), ParseError>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(bytes).await.map_err(ParseError::sink)
}
