use std::path::PathBuf;

use courier::config::UploadConfig;
use courier::http::connection::Connection;
use courier::server::slots::SlotTable;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_test::io::Builder;

fn upload_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("courier-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn uploads(dir: PathBuf, max_line: usize) -> UploadConfig {
    UploadConfig { dir, max_line }
}

fn upload_request(filename: &str, content: &[u8]) -> Vec<u8> {
    let mut req = Vec::new();
    req.extend_from_slice(b"POST /image-upload HTTP/1.1\r\n");
    req.extend_from_slice(b"Host: localhost:8080\r\n");
    req.extend_from_slice(b"Content-Type: multipart/form-data; boundary=----Boundary7MA4\r\n");
    req.extend_from_slice(b"\r\n");
    req.extend_from_slice(b"------Boundary7MA4\r\n");
    req.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    req.extend_from_slice(b"Content-Type: image/bmp\r\n\r\n");
    req.extend_from_slice(content);
    req.extend_from_slice(b"\r\n------Boundary7MA4--\r\n");
    req
}

/// Sends `request` over an in-memory stream and returns the raw response.
async fn exchange(request: &[u8], config: UploadConfig) -> (String, bool) {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let task = tokio::spawn(async move {
        let mut conn = Connection::new(server, &config);
        conn.run().await.unwrap();
        conn.is_idle()
    });

    client.write_all(request).await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();

    let idle = task.await.unwrap();
    (String::from_utf8_lossy(&response).into_owned(), idle)
}

#[tokio::test]
async fn test_upload_is_stored_and_redirected() {
    let dir = upload_dir("stored");
    let content: Vec<u8> = (0..=255u8).cycle().take(20_000).collect();

    let (response, idle) =
        exchange(&upload_request("cat.bmp", &content), uploads(dir.clone(), 1024)).await;

    assert!(response.starts_with("HTTP/1.1 303 See Other\r\n"));
    assert!(response.contains("Location: /\r\n"));
    assert!(idle);
    assert_eq!(std::fs::read(dir.join("cat.bmp")).unwrap(), content);
}

#[tokio::test]
async fn test_index_serves_upload_form() {
    let dir = upload_dir("index");
    let (response, _) = exchange(b"GET / HTTP/1.1\r\n\r\n", uploads(dir, 1024)).await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("enctype=\"multipart/form-data\""));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let dir = upload_dir("not-found");
    let (response, _) =
        exchange(b"GET /image-filter?filter=greyscale HTTP/1.1\r\n\r\n", uploads(dir, 1024)).await;

    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
}

#[tokio::test]
async fn test_malformed_request_line_gets_bad_request() {
    let dir = upload_dir("malformed");
    let (response, idle) = exchange(b"GARBAGE\r\n", uploads(dir, 1024)).await;

    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(idle);
}

#[tokio::test]
async fn test_overlong_line_gets_bad_request() {
    let dir = upload_dir("overlong");
    let request = vec![b'a'; 200];
    let (response, _) = exchange(&request, uploads(dir, 64)).await;

    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_upload_with_overlong_cookie_header() {
    let dir = upload_dir("cookie");
    let plain = upload_request("cookie.bmp", b"image bytes");
    let host = b"Host: localhost:8080\r\n";
    let at = plain.windows(host.len()).position(|w| w == host).unwrap() + host.len();

    let mut request = plain[..at].to_vec();
    request.extend_from_slice(b"Cookie: ");
    request.extend(std::iter::repeat_n(b'k', 1500));
    request.extend_from_slice(b"\r\n");
    request.extend_from_slice(&plain[at..]);

    let (response, idle) = exchange(&request, uploads(dir.clone(), 1024)).await;

    assert!(response.starts_with("HTTP/1.1 303 See Other\r\n"));
    assert!(idle);
    assert_eq!(std::fs::read(dir.join("cookie.bmp")).unwrap(), b"image bytes");
}

#[tokio::test]
async fn test_tiny_line_limit_does_not_panic() {
    let dir = upload_dir("tiny");
    let (response, idle) = exchange(b"GET / HTTP/1.1\r\n\r\n", uploads(dir, 2)).await;

    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(idle);
}

#[tokio::test]
async fn test_abandoned_upload_leaves_no_state() {
    let dir = upload_dir("abandoned");
    let mut request = upload_request("half.bmp", b"partial");
    request.truncate(request.len() - 10);

    let mut builder = Builder::new();
    for chunk in request.chunks(17) {
        builder.read(chunk);
    }
    let mut conn = Connection::new(builder.build(), &uploads(dir.clone(), 1024));

    conn.run().await.unwrap();

    assert!(conn.is_idle());
    assert!(conn.request().is_none());
    assert!(!dir.join("half.bmp").exists());
}

#[tokio::test]
async fn test_peer_closing_before_request_is_quiet() {
    let dir = upload_dir("quiet");
    let mut conn = Connection::new(Builder::new().build(), &uploads(dir, 1024));

    conn.run().await.unwrap();

    assert!(conn.is_idle());
}

#[tokio::test]
async fn test_slot_is_reusable_after_abandoned_upload() {
    let dir = upload_dir("slots");
    let config = uploads(dir, 1024);
    let mut table = SlotTable::new(1);

    let request = upload_request("gone.bmp", b"abc");
    let partial = &request[..request.len() - 5];
    let id = table
        .acquire(Connection::new(Builder::new().read(partial).build(), &config))
        .unwrap_or_else(|_| panic!("slot table unexpectedly full"));

    table.get_mut(id).unwrap().run().await.unwrap();
    assert!(table.get(id).unwrap().is_idle());

    assert!(table.release(id).is_some());
    assert_eq!(table.occupied(), 0);

    let reused = table
        .acquire(Connection::new(Builder::new().build(), &config))
        .unwrap_or_else(|_| panic!("released slot was not reusable"));
    assert_eq!(reused, id);
    assert!(table.get(reused).unwrap().is_idle());
}
