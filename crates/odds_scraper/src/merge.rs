use std::collections::HashSet;

use crate::model::MatchOdds;

/// The betting day starts at 16:30 and runs past midnight.
pub const BETTING_DAY_START: u32 = 16 * 60 + 30;
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Minutes since the start of the betting day's calendar date, so that
/// `00:10` (1450) sorts after `23:50` (1430). Unparsable times sort last.
pub fn betting_minutes(time: &str) -> u32 {
    let Some((h, m)) = time.trim().split_once(':') else {
        return u32::MAX;
    };
    let (Ok(h), Ok(m)) = (h.trim().parse::<u32>(), m.trim().parse::<u32>()) else {
        return u32::MAX;
    };
    let mins = h * 60 + m;
    if mins < BETTING_DAY_START {
        mins + MINUTES_PER_DAY
    } else {
        mins
    }
}

/// Concatenates per-frame results, keeps the first record per
/// `time-home-away`, and orders by betting-day clock. The sort is stable.
pub fn merge_and_sort(per_frame: Vec<Vec<MatchOdds>>) -> Vec<MatchOdds> {
    let mut seen = HashSet::new();
    let mut unique: Vec<MatchOdds> = per_frame
        .into_iter()
        .flatten()
        .filter(|m| seen.insert(m.key()))
        .collect();
    unique.sort_by_key(|m| betting_minutes(&m.time));
    unique
}
