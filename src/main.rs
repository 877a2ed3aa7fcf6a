/// Oddsboard: HTTP server
///
///   GET  /health           liveness
///   POST /scrape-odds      drive the bookmaker page, return sorted matches
///   POST /fetch-rankings   league tables
///
/// The `/api/` prefix is accepted on every route. Scrapes are serialized,
/// so a second request waits for the running browser session to finish.
///
/// Run:
///   cargo run --bin odds-server

use anyhow::{Context, Result};
use dotenv::dotenv;
use logger::{init_tracing, EventLogger};
use oddsboard::{http, ScrapeService};
use page_session::env::env_string;
use std::env;
use std::fs::File;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("=== Oddsboard server ===");

    // Single instance lock
    let lock_file_path = env::temp_dir().join("oddsboard_server.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of odds-server is already running! Exiting.");
            return Ok(());
        }
    };

    let bind: SocketAddr = env_string("SERVER_BIND", "127.0.0.1:3001")
        .parse()
        .context("SERVER_BIND must be host:port")?;
    let events = Arc::new(EventLogger::new(env_string("LOG_DIR", "logs")));
    info!("Logs: {}", events.log_dir().display());

    let service = Arc::new(ScrapeService::from_env(events));
    http::serve(service, bind).await
}
