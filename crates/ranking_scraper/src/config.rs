use page_session::env::{env_parse, env_string};
use page_session::PollPolicy;
use std::time::Duration;

use crate::model::RankingLeague;

pub const DEFAULT_LEAGUES: &[(&str, &str)] = &[
    ("Premier League", "https://www.fotmob.com/leagues/47/table/premier-league"),
    ("La Liga", "https://www.fotmob.com/leagues/87/table/laliga"),
    ("Bundesliga", "https://www.fotmob.com/leagues/54/table/bundesliga"),
    ("Serie A", "https://www.fotmob.com/leagues/55/table/serie-a"),
    ("Ligue 1", "https://www.fotmob.com/leagues/53/table/ligue-1"),
];

/// Cookie banners are matched on any of these (case-insensitive).
pub const CONSENT_TOKENS: &[&str] = &["accept", "agree", "allow"];
pub const CONSENT_BUTTON: &str = "button";

/// Characters of page text kept when a league yields nothing.
pub const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, Copy)]
pub struct RankingTimings {
    pub settle_interval: Duration,
    /// Ceiling for the table rows to show up after navigation.
    pub rows_wait: Duration,
    /// Added to `rows_wait` after the consent banner was dismissed.
    pub consent_wait: Duration,
    pub league_pause: Duration,
}

impl Default for RankingTimings {
    fn default() -> Self {
        Self {
            settle_interval: Duration::from_millis(250),
            rows_wait: Duration::from_secs(3),
            consent_wait: Duration::from_secs(2),
            league_pause: Duration::from_secs(1),
        }
    }
}

impl RankingTimings {
    pub fn rows(&self, after_consent: bool) -> PollPolicy {
        let ceiling = if after_consent { self.rows_wait + self.consent_wait } else { self.rows_wait };
        PollPolicy::within(ceiling, self.settle_interval)
    }
}

#[derive(Debug, Clone)]
pub struct RankingConfig {
    pub leagues: Vec<RankingLeague>,
    pub timings: RankingTimings,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            leagues: default_leagues(),
            timings: RankingTimings::default(),
        }
    }
}

impl RankingConfig {
    pub fn from_env() -> Self {
        let raw = env_string("RANKING_LEAGUES", "");
        let parsed = parse_league_list(&raw);
        Self {
            leagues: if parsed.is_empty() { default_leagues() } else { parsed },
            timings: RankingTimings {
                settle_interval: Duration::from_millis(env_parse("SETTLE_INTERVAL_MS", 250)),
                ..RankingTimings::default()
            },
        }
    }
}

pub fn default_leagues() -> Vec<RankingLeague> {
    DEFAULT_LEAGUES.iter().map(|(n, u)| RankingLeague::new(n, u)).collect()
}

/// `Name=url;Name=url`. Entries without both parts are dropped.
pub fn parse_league_list(raw: &str) -> Vec<RankingLeague> {
    raw.split(';')
        .filter_map(|entry| {
            let (name, url) = entry.split_once('=')?;
            let (name, url) = (name.trim(), url.trim());
            (!name.is_empty() && !url.is_empty()).then(|| RankingLeague::new(name, url))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_list_keeps_well_formed_entries() {
        let leagues = parse_league_list(
            " Eredivisie = https://example.com/t?a=1 ;broken; =https://x ;MLS=https://example.com/mls",
        );
        assert_eq!(
            leagues,
            vec![
                RankingLeague::new("Eredivisie", "https://example.com/t?a=1"),
                RankingLeague::new("MLS", "https://example.com/mls"),
            ]
        );
    }

    #[test]
    fn defaults_cover_five_leagues() {
        let cfg = RankingConfig::default();
        assert_eq!(cfg.leagues.len(), 5);
        assert_eq!(cfg.leagues[0].name, "Premier League");
        assert_eq!(cfg.timings.rows(false).ceiling(), Duration::from_secs(3));
        assert_eq!(cfg.timings.rows(true).ceiling(), Duration::from_secs(5));
    }
}
