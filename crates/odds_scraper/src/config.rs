use page_session::env::{env_list, env_parse, env_string};
use page_session::PollPolicy;
use std::time::Duration;

pub const DEFAULT_ODDS_URL: &str = "https://www.sport368.com";

pub const DEFAULT_TARGET_LEAGUES: &[&str] = &[
    "ENGLISH PREMIER LEAGUE",
    "GERMANY BUNDESLIGA 1",
    "ITALY SERIE A",
    "FRANCE LEAGUE 1",
    "SPAIN PREMIER LALIGA",
    "UEFA CHAMPIONS LEAGUE",
    "UEFA EUROPA LEAGUE",
    "WORLD CUP",
];

// ── Page selectors ───────────────────────────────────────────────────────────

pub const CURRENCY_MARKER: &str = "#li_ddlCountry a";
pub const LINE_MARKER: &str = "#li_ddlLine a";
/// Either settings control means the dashboard is interactive.
pub const READY_MARKER: &str = "#li_ddlCountry a, #li_ddlLine a";
pub const CURRENCY_OPTIONS: &str = "ul.subs li a";
pub const LINE_OPTIONS: &str = "li.lineType_double a";
pub const LEAGUE_FILTER: &str = "#league-wrapper a, span.leagueFilter";
pub const LEAGUE_LABELS: &str = "label";
/// Commit controls, tried in order until one takes the click.
pub const LEAGUE_CONFIRMS: &[&str] = &["#btnOk", "input[value=\"OK\"]"];

/// One page-level display option driven through a dropdown.
#[derive(Debug, Clone)]
pub struct DisplaySetting {
    pub name: &'static str,
    /// Dropdown anchor; its text is the currently displayed value.
    pub marker: &'static str,
    /// Current value is acceptable when it contains any of these.
    pub desired: Vec<String>,
    pub options: &'static str,
    /// Option to pick; empty picks the first element under `options`.
    pub option_tokens: Vec<String>,
    /// Ceiling for the dropdown to open.
    pub open_wait: Duration,
    /// Ceiling for the frame to reload with the new value.
    pub apply_wait: Duration,
}

impl DisplaySetting {
    pub fn currency(tokens: Vec<String>) -> Self {
        Self {
            name: "currency",
            marker: CURRENCY_MARKER,
            desired: tokens.clone(),
            options: CURRENCY_OPTIONS,
            option_tokens: tokens,
            open_wait: Duration::from_millis(1000),
            apply_wait: Duration::from_millis(3000),
        }
    }

    pub fn odds_format(token: String) -> Self {
        Self {
            name: "odds format",
            marker: LINE_MARKER,
            desired: vec![token],
            options: LINE_OPTIONS,
            option_tokens: Vec::new(),
            open_wait: Duration::from_millis(800),
            apply_wait: Duration::from_millis(2000),
        }
    }

    pub fn is_applied(&self, current: &str) -> bool {
        self.desired.iter().any(|t| current.contains(t.as_str()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Readiness gate: 600 × 1 s.
    pub ready: PollPolicy,
    /// Step between checks of every other bounded wait.
    pub settle_interval: Duration,
    pub filter_open_wait: Duration,
    /// Ceiling for a commit control to show after the labels are toggled.
    pub toggle_settle: Duration,
    pub filter_confirm_wait: Duration,
    /// Waiting for any frame to show a kickoff time before scanning.
    pub data_wait: PollPolicy,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            ready: PollPolicy::fixed(Duration::from_secs(1), 600),
            settle_interval: Duration::from_millis(250),
            filter_open_wait: Duration::from_millis(2000),
            toggle_settle: Duration::from_millis(1000),
            filter_confirm_wait: Duration::from_millis(3000),
            data_wait: PollPolicy::fixed(Duration::from_secs(1), 8),
        }
    }
}

impl Timings {
    pub fn settle(&self, ceiling: Duration) -> PollPolicy {
        PollPolicy::within(ceiling, self.settle_interval)
    }
}

#[derive(Debug, Clone)]
pub struct OddsConfig {
    pub url: String,
    pub target_leagues: Vec<String>,
    pub settings: Vec<DisplaySetting>,
    pub timings: Timings,
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ODDS_URL.to_string(),
            target_leagues: DEFAULT_TARGET_LEAGUES.iter().map(|s| s.to_string()).collect(),
            settings: vec![
                DisplaySetting::currency(vec!["MMR".into(), "MMK".into()]),
                DisplaySetting::odds_format("Double".into()),
            ],
            timings: Timings::default(),
        }
    }
}

impl OddsConfig {
    pub fn from_env() -> Self {
        let d = Timings::default();
        let timings = Timings {
            ready: PollPolicy::fixed(
                Duration::from_millis(env_parse("READY_INTERVAL_MS", 1000)),
                env_parse("READY_MAX_ATTEMPTS", 600),
            ),
            settle_interval: Duration::from_millis(env_parse("SETTLE_INTERVAL_MS", 250)),
            ..d
        };

        Self {
            url: env_string("ODDS_URL", DEFAULT_ODDS_URL),
            target_leagues: env_list("ODDS_TARGET_LEAGUES", DEFAULT_TARGET_LEAGUES),
            settings: vec![
                DisplaySetting::currency(env_list("ODDS_CURRENCY_TOKENS", &["MMR", "MMK"])),
                DisplaySetting::odds_format(env_string("ODDS_LINE_TOKEN", "Double")),
            ],
            timings,
        }
    }
}
