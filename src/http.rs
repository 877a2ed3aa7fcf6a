//! Minimal HTTP/1.1 surface: one request per connection, JSON out.

use anyhow::{Context, Result};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::service::ScrapeService;

const JSON: &str = "application/json; charset=utf-8";

#[derive(Debug)]
pub struct Reply {
    pub status_line: &'static str,
    pub body: String,
}

impl Reply {
    fn json(status_line: &'static str, value: serde_json::Value) -> Self {
        Self { status_line, body: value.to_string() }
    }

    fn empty(status_line: &'static str) -> Self {
        Self { status_line, body: String::new() }
    }

    fn render(&self) -> String {
        format!(
            "{}\r\nContent-Type: {JSON}\r\nContent-Length: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
             Access-Control-Allow-Headers: Content-Type\r\n\
             Connection: close\r\n\r\n{}",
            self.status_line,
            self.body.len(),
            self.body
        )
    }
}

/// Drops the query string and the legacy `/api` prefix.
fn route_path(target: &str) -> &str {
    let path = target.split('?').next().unwrap_or_default();
    match path.strip_prefix("/api") {
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

pub async fn route(service: &ScrapeService, method: &str, target: &str) -> Reply {
    match (method, route_path(target)) {
        ("OPTIONS", _) => Reply::empty("HTTP/1.1 204 No Content"),
        ("GET", "/health") => Reply::json(
            "HTTP/1.1 200 OK",
            json!({ "status": "ok", "message": "Backend is running" }),
        ),
        ("POST", "/scrape-odds") => match service.scrape_odds().await {
            Ok(matches) => Reply::json("HTTP/1.1 200 OK", json!({ "success": true, "matches": matches })),
            Err(e) => {
                error!("scrape-odds failed: {:#}", e);
                Reply::json(
                    "HTTP/1.1 500 Internal Server Error",
                    json!({ "success": false, "error": format!("{e:#}") }),
                )
            }
        },
        ("POST", "/fetch-rankings") => {
            let rankings = service.fetch_rankings().await;
            Reply::json("HTTP/1.1 200 OK", json!({ "success": true, "rankings": rankings }))
        }
        _ => Reply::json("HTTP/1.1 404 Not Found", json!({ "success": false, "error": "not found" })),
    }
}

async fn handle_connection(mut stream: TcpStream, service: Arc<ScrapeService>) -> Result<()> {
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await.context("http read")?;
    if n == 0 {
        return Ok(());
    }

    let req = String::from_utf8_lossy(&buf[..n]);
    let first_line = req.lines().next().unwrap_or_default();
    let mut parts = first_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("");
    debug!("{} {}", method, target);

    let reply = route(&service, method, target).await;
    stream.write_all(reply.render().as_bytes()).await.context("http write")?;
    Ok(())
}

pub async fn serve(service: Arc<ScrapeService>, bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind).await.context("http bind")?;
    info!(
        "Server running on http://{} (GET /health, POST /scrape-odds, POST /fetch-rankings)",
        listener.local_addr().unwrap_or(bind)
    );
    serve_on(listener, service).await
}

pub async fn serve_on(listener: TcpListener, service: Arc<ScrapeService>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await.context("http accept")?;
        let service = service.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, service).await {
                debug!("http handler err {}: {}", peer, e);
            }
        });
    }
}
