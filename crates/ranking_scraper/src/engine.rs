use anyhow::{Context, Result};
use logger::{EventLogger, RankingMissEvent};
use page_session::{poll_until, FrameHandle, PageSession, PollPolicy, SessionLauncher};
use std::sync::{Arc, Mutex};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{RankingConfig, CONSENT_BUTTON, CONSENT_TOKENS, EXCERPT_CHARS};
use crate::model::{RankingEntry, RankingLeague};
use crate::parser::parse_rankings;

/// Visits every configured league table in one browser session.
pub struct RankingEngine {
    launcher: Arc<dyn SessionLauncher>,
    config: RankingConfig,
    events: Option<Arc<EventLogger>>,
}

impl RankingEngine {
    pub fn new(launcher: Arc<dyn SessionLauncher>, config: RankingConfig) -> Self {
        Self { launcher, config, events: None }
    }

    pub fn with_events(mut self, events: Arc<EventLogger>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Never fails. Whatever was collected before a session-level failure
    /// (launch, navigation) is returned, possibly nothing.
    pub async fn fetch(&self) -> Vec<RankingEntry> {
        info!("=== Starting ranking fetch: {} leagues ===", self.config.leagues.len());
        let session = match self.launcher.launch().await {
            Ok(s) => s,
            Err(e) => {
                error!("Ranking fetch error: {:#}", e);
                return Vec::new();
            }
        };

        let mut all = Vec::new();
        if let Err(e) = self.run(session.as_ref(), &mut all).await {
            error!("Ranking fetch error: {:#}", e);
        }

        if let Err(e) = session.close().await {
            warn!("Browser release failed: {}", e);
        }
        info!("Collected {} ranking entries", all.len());
        all
    }

    async fn run(&self, session: &dyn PageSession, all: &mut Vec<RankingEntry>) -> Result<()> {
        for (i, league) in self.config.leagues.iter().enumerate() {
            info!("Fetching {} from {}", league.name, league.url);
            session
                .navigate(&league.url)
                .await
                .with_context(|| format!("Failed to open {}", league.url))?;

            let consented = i == 0 && accept_cookies(session).await;
            match self.extract(session, league, self.config.timings.rows(consented)).await {
                Ok(entries) if !entries.is_empty() => {
                    info!("Found {} teams in {}", entries.len(), league.name);
                    all.extend(entries);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Error extracting {}: {:#}", league.name, e);
                    if let Ok(title) = session.title().await {
                        info!("Current page title: {}", title);
                    }
                }
            }

            sleep(self.config.timings.league_pause).await;
        }
        Ok(())
    }

    async fn extract(
        &self,
        session: &dyn PageSession,
        league: &RankingLeague,
        policy: PollPolicy,
    ) -> Result<Vec<RankingEntry>> {
        let main = FrameHandle::main();
        let found: Mutex<Vec<RankingEntry>> = Mutex::new(Vec::new());
        let (frame, slot, name) = (&main, &found, league.name.as_str());

        poll_until(policy, move || async move {
            let Ok(text) = session.body_text(frame).await else {
                return false;
            };
            let entries = parse_rankings(name, &text);
            if entries.is_empty() {
                return false;
            }
            *slot.lock().unwrap_or_else(|e| e.into_inner()) = entries;
            true
        })
        .await;

        let entries = found.into_inner().unwrap_or_else(|e| e.into_inner());
        if !entries.is_empty() {
            return Ok(entries);
        }

        let text = session.body_text(&main).await.context("Failed to read page text")?;
        let entries = parse_rankings(&league.name, &text);
        if entries.is_empty() {
            self.record_miss(league, &text);
        }
        Ok(entries)
    }

    fn record_miss(&self, league: &RankingLeague, text: &str) {
        let excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
        warn!("No rankings parsed for {}. First {} chars: {:?}", league.name, EXCERPT_CHARS, excerpt);
        if let Some(events) = &self.events {
            let _ = events.log(&RankingMissEvent::new(&league.name, excerpt));
        }
    }
}

/// Dismisses the cookie banner if one is showing. Failures are ignored.
async fn accept_cookies(session: &dyn PageSession) -> bool {
    let tokens: Vec<String> = CONSENT_TOKENS.iter().map(|t| t.to_string()).collect();
    match session.click_containing(&FrameHandle::main(), CONSENT_BUTTON, &tokens).await {
        Ok(true) => {
            info!("Clicked cookie consent button");
            true
        }
        _ => false,
    }
}
