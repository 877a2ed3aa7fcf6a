//! Oddsboard: odds extraction engine
//!
//! Drives the bookmaker dashboard through a [`page_session::PageSession`]:
//!   1. wait until the page is interactive (start button or settings control)
//!   2. pin currency + odds format so rows read the same way every run
//!   3. tick the target leagues in the league filter
//!   4. scan every frame for row-shaped elements
//!   5. parse each row into time / teams / handicap / over-under
//!   6. merge across frames and sort by betting day (starts 16:30)

pub mod config;
pub mod engine;
pub mod league_filter;
pub mod merge;
pub mod model;
pub mod progress;
pub mod readiness;
pub mod row_parser;
pub mod scanner;
pub mod settings;

pub use config::{DisplaySetting, OddsConfig, Timings};
pub use engine::OddsEngine;
pub use model::MatchOdds;
pub use progress::{FanOut, OverlayReporter, Phase, ProgressReporter, TracingReporter};
