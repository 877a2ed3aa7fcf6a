//! Oddsboard: league table rankings
//!
//! Opens each configured league table page, reads the flattened page text and
//! picks out `rank` / `team` line pairs. A league that yields nothing is
//! logged and skipped.

pub mod config;
pub mod engine;
pub mod model;
pub mod parser;

pub use config::{RankingConfig, RankingTimings};
pub use engine::RankingEngine;
pub use model::{RankingEntry, RankingLeague};
pub use parser::parse_rankings;
