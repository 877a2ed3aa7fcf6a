//! Frame scanner: gathers row-shaped candidates from every frame and parses
//! them into match records.

use anyhow::Result;
use page_session::{poll_until, FrameHandle, PageSession, PollPolicy};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::model::MatchOdds;
use crate::row_parser::{contains_time, parse_row, Reject};

/// One way of finding candidate rows in a frame.
#[derive(Debug, Clone)]
pub struct ExtractionStrategy {
    pub name: &'static str,
    pub selectors: Vec<&'static str>,
    /// Yield needed for this strategy to be trusted; `0` accepts anything.
    pub min_yield: usize,
}

/// Structural rows first; when they come back with 5 or fewer elements the
/// frame is probably not the data region and every `div` is scanned instead.
pub fn default_strategies() -> Vec<ExtractionStrategy> {
    vec![
        ExtractionStrategy {
            name: "structural",
            selectors: vec!["tr", ".line_row", ".lines_row"],
            min_yield: 6,
        },
        ExtractionStrategy {
            name: "generic",
            selectors: vec!["div"],
            min_yield: 0,
        },
    ]
}

/// Candidate texts from the first strategy whose yield is adequate. The last
/// strategy is accepted whatever it returns.
pub async fn gather_candidates(
    session: &dyn PageSession,
    frame: &FrameHandle,
    strategies: &[ExtractionStrategy],
) -> Result<(&'static str, Vec<String>)> {
    let mut last = ("none", Vec::new());
    for (i, strategy) in strategies.iter().enumerate() {
        let texts = session.texts_of(frame, &strategy.selectors).await?;
        let is_last = i + 1 == strategies.len();
        if texts.len() >= strategy.min_yield || is_last {
            return Ok((strategy.name, texts));
        }
        debug!(%frame, strategy = strategy.name, yield_ = texts.len(), "strategy too sparse");
        last = (strategy.name, texts);
    }
    Ok(last)
}

/// Parses candidates of one frame, dropping rows already emitted by this frame.
pub fn parse_candidates(candidates: &[String]) -> (Vec<MatchOdds>, HashMap<Reject, usize>) {
    let mut seen = HashSet::new();
    let mut rejects: HashMap<Reject, usize> = HashMap::new();
    let mut out = Vec::new();

    for text in candidates {
        match parse_row(text) {
            Ok(m) => {
                let key = format!("{}{}{}", m.time, m.home, m.away);
                if seen.insert(key) {
                    out.push(m);
                }
            }
            Err(r) => *rejects.entry(r).or_default() += 1,
        }
    }
    (out, rejects)
}

pub async fn scan_frame(
    session: &dyn PageSession,
    frame: &FrameHandle,
    strategies: &[ExtractionStrategy],
) -> Result<Vec<MatchOdds>> {
    let (strategy, candidates) = gather_candidates(session, frame, strategies).await?;
    let (matches, rejects) = parse_candidates(&candidates);
    debug!(
        %frame,
        strategy,
        candidates = candidates.len(),
        matches = matches.len(),
        "frame scanned, rejects: {:?}",
        rejects
    );
    Ok(matches)
}

/// Scans every frame in page order. A frame that errors contributes nothing
/// and does not stop the others.
pub async fn scan_all_frames(
    session: &dyn PageSession,
    strategies: &[ExtractionStrategy],
) -> Result<Vec<Vec<MatchOdds>>> {
    let frames = session.frames().await?;
    let mut per_frame = Vec::with_capacity(frames.len());

    for frame in &frames {
        match scan_frame(session, frame, strategies).await {
            Ok(matches) => {
                if !matches.is_empty() {
                    info!("Frame {} yielded {} matches", frame, matches.len());
                }
                per_frame.push(matches);
            }
            Err(e) => {
                warn!("Frame {} scan failed: {}", frame, e);
                per_frame.push(Vec::new());
            }
        }
    }
    Ok(per_frame)
}

/// Waits until some frame's text carries a kickoff time. Returns whether it did.
pub async fn wait_for_data(session: &dyn PageSession, policy: PollPolicy) -> bool {
    poll_until(policy, move || async move {
        let Ok(frames) = session.frames().await else {
            return false;
        };
        for frame in &frames {
            if let Ok(text) = session.body_text(frame).await {
                if contains_time(&text) {
                    return true;
                }
            }
        }
        false
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_frame_duplicates_are_emitted_once() {
        let rows = vec![
            "20:45\nArsenal\nChelsea\n1(25)A".to_string(),
            "20:45\nArsenal\nChelsea\n0/0.5(50)".to_string(),
            "Login Time 12:00".to_string(),
            "short".to_string(),
        ];
        let (matches, rejects) = parse_candidates(&rows);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].handicap, "1(25)A");
        assert_eq!(rejects[&Reject::Junk], 1);
        assert_eq!(rejects[&Reject::Length], 1);
    }

    #[test]
    fn structural_threshold_is_more_than_five() {
        let s = default_strategies();
        assert_eq!(s[0].min_yield, 6);
        assert_eq!(s[1].selectors, vec!["div"]);
    }
}
