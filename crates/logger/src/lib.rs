/// Oddsboard: Logger
/// tracing init + JSONL diagnostic event stream

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

/// Appends scrape diagnostics as JSON lines to `<log_dir>/<YYYY-MM-DD>.jsonl`.
pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    /// Creating the directory is best effort; a missing directory shows up
    /// as an error on the first `log` call instead.
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Today's file (UTC date).
    pub fn current_file(&self) -> PathBuf {
        let date = Utc::now().format("%Y-%m-%d");
        self.log_dir.join(format!("{date}.jsonl"))
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let path = self.current_file();
        let line = serde_json::to_string(event).context("Failed to serialize diagnostic event")?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open event log {}", path.display()))?;
        writeln!(f, "{line}").with_context(|| format!("Failed to append to {}", path.display()))?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Installs the global fmt subscriber. `RUST_LOG` wins, otherwise `info`.
pub fn init_tracing() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .try_init();
}

// ── Event types────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct ScrapeRunEvent {
    pub ts:         String,
    pub event:      &'static str,   // "SCRAPE_RUN"
    pub flow:       String,         // "odds" | "rankings"
    pub ok:         bool,
    pub items:      usize,
    pub elapsed_ms: u64,
    pub message:    String,
}

impl ScrapeRunEvent {
    pub fn new(flow: &str, ok: bool, items: usize, elapsed_ms: u64, message: impl Into<String>) -> Self {
        Self {
            ts: now_iso(),
            event: "SCRAPE_RUN",
            flow: flow.to_string(),
            ok,
            items,
            elapsed_ms,
            message: message.into(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct RankingMissEvent {
    pub ts:      String,
    pub event:   &'static str,   // "RANKING_MISS"
    pub league:  String,
    pub excerpt: String,
}

impl RankingMissEvent {
    pub fn new(league: &str, excerpt: impl Into<String>) -> Self {
        Self {
            ts: now_iso(),
            event: "RANKING_MISS",
            league: league.to_string(),
            excerpt: excerpt.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let logger = EventLogger::new(dir.path());

        logger.log(&ScrapeRunEvent::new("odds", true, 12, 3400, "ok")).unwrap();
        logger.log(&RankingMissEvent::new("Serie A", "Cookies")).unwrap();

        let body = fs::read_to_string(logger.current_file()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "SCRAPE_RUN");
        assert_eq!(first["items"], 12);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["league"], "Serie A");
    }

    #[test]
    fn unwritable_log_dir_is_reported_with_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("logs");
        fs::write(&blocker, "not a directory").unwrap();
        let logger = EventLogger::new(&blocker);

        let err = logger.log(&RankingMissEvent::new("La Liga", "")).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("Failed to open event log"), "{message}");
        assert!(message.contains("logs"), "{message}");
        assert_eq!(logger.log_dir(), blocker.as_path());
    }
}
