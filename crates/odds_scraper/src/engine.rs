use anyhow::{Context, Result};
use page_session::{PageSession, SessionLauncher};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::{OddsConfig, READY_MARKER};
use crate::league_filter::apply_league_filter;
use crate::merge::merge_and_sort;
use crate::model::MatchOdds;
use crate::progress::{Phase, ProgressReporter};
use crate::readiness::wait_until_ready;
use crate::scanner::{default_strategies, scan_all_frames, wait_for_data, ExtractionStrategy};
use crate::settings::configure_settings;

/// Odds extraction workflow: readiness → settings → league filter → frame
/// scan → merge. One browser session per [`OddsEngine::scrape`] call.
pub struct OddsEngine {
    launcher: Arc<dyn SessionLauncher>,
    config: OddsConfig,
    strategies: Vec<ExtractionStrategy>,
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl OddsEngine {
    pub fn new(launcher: Arc<dyn SessionLauncher>, config: OddsConfig) -> Self {
        Self {
            launcher,
            config,
            strategies: default_strategies(),
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<ExtractionStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn config(&self) -> &OddsConfig {
        &self.config
    }

    /// Runs every phase once. Anything that stops the flow as a whole
    /// (launch, first navigation, losing the page) is returned as an error;
    /// the session is released on every path.
    pub async fn scrape(&self) -> Result<Vec<MatchOdds>> {
        info!("=== Starting odds scrape: {} ===", self.config.url);
        let started = Instant::now();
        let session = self.launcher.launch().await.context("Failed to start browser session")?;

        let result = self.run(session.as_ref()).await;
        match &result {
            Ok(matches) => info!(
                "Extracted {} matches in {:.1}s",
                matches.len(),
                started.elapsed().as_secs_f64()
            ),
            Err(e) => {
                error!("Fatal odds scrape error: {:#}", e);
                if !session.is_closed().await {
                    self.report(session.as_ref(), Phase::Failed(e.to_string())).await;
                }
            }
        }

        if let Err(e) = session.close().await {
            warn!("Browser release failed: {}", e);
        }
        result
    }

    async fn run(&self, session: &dyn PageSession) -> Result<Vec<MatchOdds>> {
        let timings = &self.config.timings;

        session
            .navigate(&self.config.url)
            .await
            .with_context(|| format!("Failed to open {}", self.config.url))?;

        self.report(session, Phase::AwaitingReadiness).await;
        let readiness = wait_until_ready(session, READY_MARKER, timings.ready).await;

        self.report(session, Phase::ConfiguringSettings).await;
        configure_settings(session, &self.config.settings, readiness.frame(), timings).await;

        self.report(session, Phase::FilteringLeagues).await;
        if let Err(e) = apply_league_filter(session, &self.config.target_leagues, timings).await {
            warn!("League filter failed, keeping current selection: {}", e);
        }

        self.report(session, Phase::Scanning).await;
        if !wait_for_data(session, timings.data_wait).await {
            info!("No kickoff times visible yet, scanning anyway");
        }
        let per_frame = scan_all_frames(session, &self.strategies)
            .await
            .context("Failed to enumerate page frames")?;
        let matches = merge_and_sort(per_frame);

        self.report(session, Phase::Completed(matches.len())).await;
        Ok(matches)
    }

    async fn report(&self, session: &dyn PageSession, phase: Phase) {
        if let Some(reporter) = &self.reporter {
            reporter.report(session, &phase).await;
        }
    }
}
