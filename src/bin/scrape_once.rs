/// One scrape from the command line, JSON on stdout.
///
///   cargo run --bin scrape-once -- odds
///   cargo run --bin scrape-once -- rankings

use anyhow::{bail, Result};
use dotenv::dotenv;
use logger::{init_tracing, EventLogger};
use oddsboard::ScrapeService;
use page_session::env::env_string;
use serde_json::json;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let mode = env::args().nth(1).unwrap_or_default();
    let events = Arc::new(EventLogger::new(env_string("LOG_DIR", "logs")));
    let service = ScrapeService::from_env(events);

    let payload = match mode.as_str() {
        "odds" => json!({ "success": true, "matches": service.scrape_odds().await? }),
        "rankings" => json!({ "success": true, "rankings": service.fetch_rankings().await }),
        _ => bail!("usage: scrape-once odds|rankings"),
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
