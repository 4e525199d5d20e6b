use crate::http::buffer::LineBuffer;
use crate::http::error::ParseError;
use crate::http::query::parse_query;
use crate::http::request::ParsedRequest;

/// Parses the request line at the front of `buffer`.
///
/// Returns [`ParseError::Incomplete`] while no complete line is buffered; the caller
/// refills and retries. On success the line is consumed from the buffer, so the bytes that
/// follow (headers, body) are left at the front.
pub fn try_parse_start_line(buffer: &mut LineBuffer) -> Result<ParsedRequest, ParseError> {
    let line = buffer.next_line().ok_or(ParseError::Incomplete)?;
    let request = parse_start_line(line);
    buffer.consume_line();
    request
}

fn parse_start_line(line: &[u8]) -> Result<ParsedRequest, ParseError> {
    let line = std::str::from_utf8(line)
        .map_err(|_| ParseError::malformed_request_line("request line is not valid UTF-8"))?;

    let mut parts = line.split(' ').filter(|part| !part.is_empty());

    let method = parts
        .next()
        .ok_or_else(|| ParseError::malformed_request_line("missing method"))?;
    let target = parts
        .next()
        .ok_or_else(|| ParseError::malformed_request_line("missing path"))?;

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    if path.is_empty() {
        return Err(ParseError::malformed_request_line("empty path"));
    }

    Ok(ParsedRequest {
        method: method.to_string(),
        path: path.strip_prefix('/').unwrap_or(path).to_string(),
        params: parse_query(query),
    })
}
