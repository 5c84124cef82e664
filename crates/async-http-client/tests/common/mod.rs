//! A minimal hand-rolled HTTP/1.1 test server, used instead of a mocking
//! dependency the rest of the stack doesn't otherwise need.

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Starts a background server on an OS-assigned port and returns its
/// address plus the task handle (dropped/aborted by the caller, or left to
/// die with the test process).
pub async fn spawn_test_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(handle_connection(socket));
        }
    });

    (addr, handle)
}

async fn handle_connection(mut socket: tokio::net::TcpStream) {
    let mut buf = vec![0u8; 8192];
    let n = match socket.read(&mut buf).await {
        Ok(n) if n > 0 => n,
        _ => return,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    if path == "/truncated" {
        // Advertise a body longer than what we actually send, then close
        // the socket mid-transfer — the client must see this as a stream
        // error, never as a short-but-successful response.
        let header = "HTTP/1.1 200 OK\r\nContent-Length: 4096\r\nConnection: close\r\n\r\n";
        let _ = socket.write_all(header.as_bytes()).await;
        let _ = socket.write_all(b"only ten b").await;
        let _ = socket.shutdown().await;
        return;
    }

    let response = route(&path).await;
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn route(path: &str) -> String {
    if let Some(ms) = path.strip_prefix("/delay/") {
        if let Ok(ms) = ms.parse::<u64>() {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }
        return respond(200, "HTTP/1.1", "delayed");
    }

    match path {
        "/test/200" => respond(200, "HTTP/1.1", "ok"),
        "/test/404" => respond(404, "HTTP/1.1", "not found"),
        "/test/500" => respond(500, "HTTP/1.1", "server error"),
        "/redirect/start" => redirect_to("/redirect/final"),
        "/redirect/final" => respond(200, "HTTP/1.1", "arrived"),
        "/redirect/loop" => redirect_to("/redirect/loop"),
        "/large" => respond(200, "HTTP/1.1", &"x".repeat(4096)),
        _ => respond(200, "HTTP/1.1", "default"),
    }
}

fn respond(status: u16, protocol: &str, body: &str) -> String {
    format!(
        "{protocol} {status} {reason}\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n{body}",
        reason = reason_phrase(status),
        len = body.len(),
    )
}

fn redirect_to(location: &str) -> String {
    format!(
        "HTTP/1.1 302 Found\r\nLocation: {location}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    )
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
