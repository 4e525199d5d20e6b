//! Locating the multipart boundary and the uploaded filename.
//!
//! Both scans work line by line on the connection's [`LineBuffer`]: lines that are not
//! the one being looked for are discarded, and when no complete line is buffered the scan
//! awaits one more socket read before looking again.

use tokio::io::AsyncRead;
use tracing::{debug, trace};

use crate::http::buffer::LineBuffer;
use crate::http::error::ParseError;

/// Header line prefix that declares the multipart boundary.
pub const BOUNDARY_HEADER: &[u8] = b"Content-Type: multipart/form-data; boundary=";

/// A multipart delimiter, stored with its leading `--` so it matches body lines directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary(String);

impl Boundary {
    /// Builds a boundary from the token declared in the `Content-Type` header.
    pub fn from_token(token: &str) -> Self {
        Self(format!("--{token}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The line that ends the multipart body: `\r\n` + boundary + `--\r\n`.
    pub fn closing_marker(&self) -> Vec<u8> {
        let mut marker = Vec::with_capacity(self.0.len() + 6);
        marker.extend_from_slice(b"\r\n");
        marker.extend_from_slice(self.as_bytes());
        marker.extend_from_slice(b"--\r\n");
        marker
    }
}

/// Waits until a complete line is buffered, refilling as needed.
///
/// A zero-byte read means the peer gave up on the request.
pub(crate) async fn fill_line<R>(buffer: &mut LineBuffer, reader: &mut R) -> Result<(), ParseError>
where
    R: AsyncRead + Unpin,
{
    while buffer.line_end().is_none() {
        if buffer.refill(reader).await? == 0 {
            return Err(ParseError::Closed);
        }
    }
    Ok(())
}

/// Like [`fill_line`], for scans that discard the line anyway.
///
/// A line too long for the buffer is dropped instead of failing the request: the buffered
/// part is discarded and the rest of it is skipped up to the next `\r\n`.
pub(crate) async fn fill_skippable_line<R>(
    buffer: &mut LineBuffer,
    reader: &mut R,
) -> Result<(), ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut skipping = false;
    loop {
        if buffer.line_end().is_some() {
            if !skipping {
                return Ok(());
            }
            buffer.consume_line();
            skipping = false;
            continue;
        }

        if buffer.remaining() == 0 {
            trace!(dropped = buffer.len(), "dropping over-long line");
            buffer.discard_partial_line();
            skipping = true;
        }

        if buffer.refill(reader).await? == 0 {
            return Err(ParseError::Closed);
        }
    }
}

/// Discards lines until the boundary declaration header and returns its boundary.
pub async fn locate_boundary_declaration<R>(
    buffer: &mut LineBuffer,
    reader: &mut R,
) -> Result<Boundary, ParseError>
where
    R: AsyncRead + Unpin,
{
    loop {
        fill_skippable_line(buffer, reader).await?;

        let token = buffer
            .next_line()
            .and_then(|line| line.strip_prefix(BOUNDARY_HEADER))
            .map(|token| String::from_utf8_lossy(token).into_owned());

        let Some(token) = token else {
            trace!("skipping header line");
            buffer.consume_line();
            continue;
        };

        buffer.consume_line();
        let token = token.trim().trim_matches('"');
        if token.is_empty() {
            return Err(ParseError::missing_boundary("empty boundary token"));
        }

        let boundary = Boundary::from_token(token);
        debug!(boundary = boundary.as_str(), "found multipart boundary");
        return Ok(boundary);
    }
}

/// Skips to the first boundary line, then extracts the filename from the header after it.
pub async fn locate_filename<R>(
    buffer: &mut LineBuffer,
    reader: &mut R,
    boundary: &Boundary,
) -> Result<String, ParseError>
where
    R: AsyncRead + Unpin,
{
    loop {
        fill_skippable_line(buffer, reader).await?;

        let at_boundary = buffer
            .next_line()
            .is_some_and(|line| line.starts_with(boundary.as_bytes()));
        buffer.consume_line();

        if at_boundary {
            break;
        }
    }

    fill_line(buffer, reader).await?;
    let filename = buffer
        .next_line()
        .ok_or(ParseError::Incomplete)
        .and_then(extract_filename);
    buffer.consume_line();

    let filename = filename?;
    debug!(filename = %filename, "found upload filename");
    Ok(filename)
}

/// Returns the text after the last `=` of a part header, without its surrounding quotes.
pub fn extract_filename(line: &[u8]) -> Result<String, ParseError> {
    let eq = line
        .iter()
        .rposition(|&b| b == b'=')
        .ok_or_else(|| ParseError::malformed_part_header("no filename attribute"))?;

    let raw = &line[eq + 1..];
    let raw = raw.strip_prefix(b"\"").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\"").unwrap_or(raw);

    if raw.is_empty() {
        return Err(ParseError::malformed_part_header("empty filename"));
    }

    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| ParseError::malformed_part_header("filename is not valid UTF-8"))
}
