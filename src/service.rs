use anyhow::Result;
use logger::{EventLogger, ScrapeRunEvent};
use odds_scraper::{FanOut, MatchOdds, OddsConfig, OddsEngine, OverlayReporter, TracingReporter};
use page_session::chrome::DEFAULT_USER_AGENT;
use page_session::{ChromeLauncher, LaunchConfig};
use ranking_scraper::{RankingConfig, RankingEngine, RankingEntry};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::info;

/// Both flows behind one single-flight gate: at most one browser session
/// exists at a time, later requests queue.
pub struct ScrapeService {
    odds: OddsEngine,
    rankings: RankingEngine,
    events: Option<Arc<EventLogger>>,
    flight: Mutex<()>,
}

impl ScrapeService {
    pub fn new(odds: OddsEngine, rankings: RankingEngine) -> Self {
        Self { odds, rankings, events: None, flight: Mutex::new(()) }
    }

    pub fn with_events(mut self, events: Arc<EventLogger>) -> Self {
        self.events = Some(events);
        self
    }

    /// Chrome-backed engines configured from the environment.
    pub fn from_env(events: Arc<EventLogger>) -> Self {
        let odds_launcher = ChromeLauncher::new(LaunchConfig::from_env());
        let odds = OddsEngine::new(Arc::new(odds_launcher), OddsConfig::from_env()).with_reporter(Arc::new(
            FanOut(vec![Arc::new(TracingReporter), Arc::new(OverlayReporter)]),
        ));

        let ranking_launcher = ChromeLauncher::new(LaunchConfig::from_env().with_user_agent(DEFAULT_USER_AGENT));
        let rankings = RankingEngine::new(Arc::new(ranking_launcher), RankingConfig::from_env())
            .with_events(events.clone());

        Self::new(odds, rankings).with_events(events)
    }

    pub async fn scrape_odds(&self) -> Result<Vec<MatchOdds>> {
        let _flight = self.flight.lock().await;
        let started = Instant::now();
        let result = self.odds.scrape().await;

        let event = match &result {
            Ok(m) => ScrapeRunEvent::new("odds", true, m.len(), elapsed_ms(started), "ok"),
            Err(e) => ScrapeRunEvent::new("odds", false, 0, elapsed_ms(started), format!("{e:#}")),
        };
        self.record(&event);
        result
    }

    pub async fn fetch_rankings(&self) -> Vec<RankingEntry> {
        let _flight = self.flight.lock().await;
        let started = Instant::now();
        let rankings = self.rankings.fetch().await;

        self.record(&ScrapeRunEvent::new("rankings", true, rankings.len(), elapsed_ms(started), "ok"));
        rankings
    }

    fn record(&self, event: &ScrapeRunEvent) {
        info!(flow = %event.flow, ok = event.ok, items = event.items, "run finished in {}ms", event.elapsed_ms);
        if let Some(events) = &self.events {
            let _ = events.log(event);
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
