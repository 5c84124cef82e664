//! A minimal hand-rolled HTTP/1.1 test server for end-to-end Processor
//! scenarios — the same shape as the one in `async-http-client`'s
//! integration tests, extended with a couple of routes this crate's
//! scenarios need (slow responses, oversized bodies).

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

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

    let response = route(&path).await;
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn route(path: &str) -> String {
    if let Some(ms) = path.strip_prefix("/delay/") {
        if let Ok(ms) = ms.parse::<u64>() {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }
        return respond(200, "delayed");
    }

    match path {
        "/ok" => respond(200, "ok"),
        "/not-found" => respond(404, "missing"),
        "/boom" => respond(500, "server error"),
        "/large" => respond(200, &"x".repeat(8192)),
        _ => respond(200, "default"),
    }
}

fn respond(status: u16, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n{body}",
        reason = reason_phrase(status),
        len = body.len(),
    )
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
