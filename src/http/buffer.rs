//! Bounded per-connection line buffer.
//!
//! Socket reads land in the unused tail of a fixed-capacity byte slice. Complete lines
//! (terminated by a network newline, `\r\n`) are inspected with [`LineBuffer::next_line`]
//! and removed with [`LineBuffer::consume_line`], which shifts whatever follows to the
//! front. A partial line stays put until more bytes arrive.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::http::error::ParseError;

/// Default buffer capacity in bytes.
pub const MAXLINE: usize = 1024;

/// Smallest capacity a buffer is created with.
pub const MIN_CAPACITY: usize = 4;

/// Returns the index immediately after the first `\r\n` in `buf`, or `None`.
///
/// Byte pairs are compared directly: a lone `\r` or `\n`, including a `\r` in the last
/// position, never matches.
pub fn find_network_newline(buf: &[u8]) -> Option<usize> {
    buf.windows(2)
        .position(|w| w == b"\r\n")
        .map(|index| index + 2)
}

#[derive(Debug)]
pub struct LineBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MAXLINE)
    }

    /// Creates a buffer of `capacity` bytes, raised to [`MIN_CAPACITY`] if smaller.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The valid, unconsumed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Room left for the next read. One byte is always held back so `len < capacity`.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.len - 1
    }

    /// Offset just past the first buffered `\r\n`.
    pub fn line_end(&self) -> Option<usize> {
        find_network_newline(self.as_bytes())
    }

    /// The first complete line, without its terminator.
    pub fn next_line(&self) -> Option<&[u8]> {
        self.line_end().map(|end| &self.data[..end - 2])
    }

    /// Drops the first complete line and moves the rest to the front.
    ///
    /// Returns `false` and leaves the buffer untouched when no complete line is buffered.
    pub fn consume_line(&mut self) -> bool {
        let Some(end) = self.line_end() else {
            return false;
        };

        self.data.copy_within(end..self.len, 0);
        let remaining = self.len - end;
        self.data[remaining..self.len].fill(0);
        self.len = remaining;
        true
    }

    /// Takes every buffered byte, leaving the buffer empty.
    pub fn take_resident(&mut self) -> Vec<u8> {
        let resident = self.as_bytes().to_vec();
        self.clear();
        resident
    }

    /// Drops a partial line that filled the buffer without a terminator.
    ///
    /// A trailing `\r` is kept so a `\r\n` split across two reads is still found.
    pub fn discard_partial_line(&mut self) {
        let keep_cr = self.as_bytes().last() == Some(&b'\r');
        self.clear();
        if keep_cr {
            self.data[0] = b'\r';
            self.len = 1;
        }
    }

    pub fn clear(&mut self) {
        self.data[..self.len].fill(0);
        self.len = 0;
    }

    /// Performs exactly one read into the unused tail.
    ///
    /// Returns the number of bytes read; `Ok(0)` means the peer closed its side. A full
    /// buffer without a complete line is reported as [`ParseError::LineTooLong`] rather
    /// than issuing a zero-length read that would be indistinguishable from end of stream.
    pub async fn refill<R>(&mut self, reader: &mut R) -> Result<usize, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        if self.remaining() == 0 {
            return Err(ParseError::LineTooLong {
                max_size: self.capacity() - 1,
            });
        }

        let end = self.capacity() - 1;
        let n = reader.read(&mut self.data[self.len..end]).await?;
        self.len += n;
        trace!(read = n, buffered = self.len, "refilled line buffer");
        Ok(n)
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
