// One-shot HTTP responders for tests

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Captured request
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub head: String,
    pub body: String,
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Serve exactly one response; returns the base URL and the captured request
pub async fn serve_once(
    status: u16,
    content_type: Option<&str>,
    body: &str,
) -> (String, oneshot::Receiver<SeenRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut response = format!("HTTP/1.1 {} Test\r\nConnection: close\r\n", status);
    if let Some(ct) = content_type {
        response.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    response.push_str(&format!("Content-Length: {}\r\n\r\n{}", body.len(), body));

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let (head, body) = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break (String::from_utf8_lossy(&buf).to_string(), String::new());
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = find_header_end(&buf) {
                let head = String::from_utf8_lossy(&buf[..end]).to_string();
                let wanted = content_length(&head);
                while buf.len() < end + wanted {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                let body = String::from_utf8_lossy(&buf[end..]).to_string();
                break (head, body);
            }
        };
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(SeenRequest { head, body });
    });

    (format!("http://{}", addr), rx)
}

/// A base URL nothing listens on
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
