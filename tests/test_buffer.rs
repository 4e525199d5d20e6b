use std::io;

use courier::http::buffer::{LineBuffer, find_network_newline};
use courier::http::error::{ErrorKind, ParseError};
use tokio::io::AsyncRead;
use tokio_test::io::Builder;

const REQUEST: &[u8] = b"POST /image-upload HTTP/1.1\r\nHost: localhost:8080\r\n\
Content-Type: multipart/form-data; boundary=----abc\r\n\r\n------abc\r\n";

async fn collect_lines<R: AsyncRead + Unpin>(reader: &mut R) -> Vec<Vec<u8>> {
    let mut buffer = LineBuffer::new();
    let mut lines = Vec::new();
    loop {
        while let Some(line) = buffer.next_line() {
            lines.push(line.to_vec());
            buffer.consume_line();
        }
        if buffer.refill(reader).await.unwrap() == 0 {
            break;
        }
    }
    lines
}

fn chunked(bytes: &[u8], size: usize) -> tokio_test::io::Mock {
    let mut builder = Builder::new();
    for chunk in bytes.chunks(size) {
        builder.read(chunk);
    }
    builder.build()
}

#[test]
fn test_find_network_newline() {
    assert_eq!(find_network_newline(b"hello\r\ngoodbye\r\nblah"), Some(7));
    assert_eq!(find_network_newline(b"no newline here"), None);
    assert_eq!(find_network_newline(b"trailing cr\r"), None);
    assert_eq!(find_network_newline(b"\r\r\n"), Some(3));
}

#[tokio::test]
async fn test_lines_are_chunking_invariant() {
    let mut whole = REQUEST;
    let expected = collect_lines(&mut whole).await;
    assert_eq!(expected.len(), 5);

    for size in [1, 2, 3, 7, 16, 64] {
        let mut reader = chunked(REQUEST, size);
        assert_eq!(collect_lines(&mut reader).await, expected, "chunk size {size}");
    }
}

#[tokio::test]
async fn test_consume_line_preserves_following_bytes() {
    let mut buffer = LineBuffer::new();
    let mut reader: &[u8] = b"hello\r\ngoodbye\r\nblah";
    buffer.refill(&mut reader).await.unwrap();

    assert!(buffer.consume_line());
    assert_eq!(buffer.as_bytes(), b"goodbye\r\nblah");

    let mut more: &[u8] = b" blah\r\n";
    buffer.refill(&mut more).await.unwrap();
    assert!(buffer.consume_line());
    assert_eq!(buffer.next_line(), Some(&b"blah blah"[..]));
}

#[tokio::test]
async fn test_consume_without_line_keeps_partial() {
    let mut buffer = LineBuffer::new();
    let mut reader: &[u8] = b"partial line";
    buffer.refill(&mut reader).await.unwrap();

    assert!(!buffer.consume_line());
    assert_eq!(buffer.as_bytes(), b"partial line");
}

#[tokio::test]
async fn test_refill_reports_end_of_stream() {
    let mut buffer = LineBuffer::new();
    let mut reader = Builder::new().build();

    assert_eq!(buffer.refill(&mut reader).await.unwrap(), 0);
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn test_refill_surfaces_io_error() {
    let mut buffer = LineBuffer::new();
    let mut reader = Builder::new()
        .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        .build();

    let err = buffer.refill(&mut reader).await.unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
    assert_eq!(err.kind(), ErrorKind::Abandoned);
}

#[tokio::test]
async fn test_refill_keeps_one_byte_in_reserve() {
    let mut buffer = LineBuffer::with_capacity(8);
    let mut reader: &[u8] = b"abcdefghij";

    assert_eq!(buffer.refill(&mut reader).await.unwrap(), 7);
    assert_eq!(buffer.len(), 7);
    assert_eq!(buffer.remaining(), 0);

    let err = buffer.refill(&mut reader).await.unwrap_err();
    assert!(matches!(err, ParseError::LineTooLong { max_size: 7 }));
    assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
}

#[tokio::test]
async fn test_take_resident_empties_buffer() {
    let mut buffer = LineBuffer::new();
    let mut reader: &[u8] = b"\x00binary\x00";
    buffer.refill(&mut reader).await.unwrap();

    assert_eq!(buffer.take_resident(), b"\x00binary\x00".to_vec());
    assert!(buffer.is_empty());
}
