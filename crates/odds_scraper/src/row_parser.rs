//! Turns one candidate element's visible text into a [`MatchOdds`].
//!
//! Rows come from markup we don't control, so everything here is heuristic:
//! a row is a match when it carries a kickoff time and two team-looking lines,
//! and odds are whatever looks like `line(price)suffix`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::MatchOdds;

pub const MIN_ROW_CHARS: usize = 10;
pub const MAX_ROW_CHARS: usize = 2000;

/// Banners, clocks and header captions that share markup with data rows.
const JUNK_MARKERS: &[&str] = &[
    "Login Time",
    "GMT",
    "Announcement",
    "Personal Msg",
    "Security Message",
    "TIME vs RUNNING BALL",
    "TIME vs EVENT",
];

const STATUS_WORDS: &[&str] = &["Live", "Running", "Live Center"];

static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{1,2}:[0-9]{2}").unwrap());

// "1(25)A", "3(10)", "0/0.5(50)"
static ODDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9./-]+)\s*\(\s*([+-]?[0-9]+)\s*\)\s*([A-Za-z]?)").unwrap());

static OU_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[ouOU]$").unwrap());

// Standalone total line, e.g. "2.5" or "3 (40)"; never digits inside "20:45".
static BARE_TOTAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)((?:2\.5|3\.5|4\.5|3|4)(?:\s*\(\s*[+-]?[0-9]+\s*\))?)(?:\s|$)").unwrap()
});

static ODDS_FRAGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9.]+\(.*\)").unwrap());

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9./-]+$").unwrap());

static VS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+vs\s+").unwrap());

/// Why a candidate was not a match row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reject {
    Length,
    Junk,
    NoTime,
    Header,
    NoTeams,
}

pub fn contains_time(text: &str) -> bool {
    TIME_RE.is_match(text)
}

pub fn parse_row(text: &str) -> Result<MatchOdds, Reject> {
    let len = text.chars().count();
    if !(MIN_ROW_CHARS..=MAX_ROW_CHARS).contains(&len) {
        return Err(Reject::Length);
    }
    if JUNK_MARKERS.iter().any(|m| text.contains(m)) {
        return Err(Reject::Junk);
    }
    if !contains_time(text) {
        return Err(Reject::NoTime);
    }
    if text.contains("Time") && text.contains("Event") {
        return Err(Reject::Header);
    }

    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let (time_line, time) = lines
        .iter()
        .find_map(|l| TIME_RE.find(l).map(|m| (*l, m.as_str().to_string())))
        .ok_or(Reject::NoTime)?;

    let raw = lines.join(" ");
    let (handicap, over_under) = classify_odds(&raw);
    let (home, away) = extract_teams(&lines, time_line).ok_or(Reject::NoTeams)?;

    Ok(MatchOdds { time, home, away, handicap, over_under, raw })
}

/// Splits odds tokens into `(handicap, over_under)`.
///
/// An `H`/`A` suffix marks a handicap. Unsuffixed tokens go to over/under once
/// a handicap is known; before that the first token is taken as the handicap
/// and any later one as over/under.
pub fn classify_odds(joined: &str) -> (String, String) {
    let mut handicap = String::new();
    let mut over_under = String::new();

    for (i, caps) in ODDS_RE.captures_iter(joined).enumerate() {
        let token = caps[0].trim_end().to_string();
        let suffix = caps.get(3).map_or("", |m| m.as_str());

        if suffix.eq_ignore_ascii_case("h") || suffix.eq_ignore_ascii_case("a") {
            handicap = token;
        } else if !handicap.is_empty() {
            if over_under.is_empty() {
                over_under = token;
            }
        } else if i == 0 {
            handicap = token;
        } else {
            over_under = token;
        }
    }

    if !over_under.is_empty() {
        over_under = OU_SUFFIX_RE.replace(&over_under, "").into_owned();
    }

    if over_under.is_empty() {
        if let Some(m) = BARE_TOTAL_RE.captures(joined).and_then(|c| c.get(1)) {
            if m.as_str() != handicap {
                over_under = m.as_str().to_string();
            }
        }
    }

    (handicap, over_under)
}

fn extract_teams(lines: &[&str], time_line: &str) -> Option<(String, String)> {
    let mut teams: Vec<String> = lines
        .iter()
        .filter(|l| {
            !STATUS_WORDS.contains(*l)
                && **l != time_line
                && !ODDS_FRAGMENT_RE.is_match(l)
                && !l.contains('(')
                && !l.contains(')')
        })
        .filter(|l| !NUMERIC_RE.is_match(l))
        .map(|l| l.to_string())
        .collect();

    if teams.len() == 1 && teams[0].to_lowercase().contains(" vs ") {
        teams = VS_RE.split(&teams[0]).map(str::to_string).collect();
    }

    let mut it = teams.into_iter();
    let home = it.next()?;
    let away = it.next()?;
    if home.is_empty() || away.is_empty() || home == away {
        return None;
    }
    Some((home, away))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_stacked_row() {
        let m = parse_row("20:45\nArsenal\nChelsea\n1(25)A\n2.5(10)").unwrap();
        assert_eq!(m.time, "20:45");
        assert_eq!(m.home, "Arsenal");
        assert_eq!(m.away, "Chelsea");
        assert_eq!(m.handicap, "1(25)A");
        assert_eq!(m.over_under, "2.5(10)");
        assert_eq!(m.raw, "20:45 Arsenal Chelsea 1(25)A 2.5(10)");
    }

    #[test]
    fn time_is_the_literal_token() {
        let m = parse_row("Live\n9:05 PM\nInter\nMilan").unwrap();
        assert_eq!(m.time, "9:05");
        assert_eq!(m.home, "Inter");
        assert_eq!(m.away, "Milan");
    }

    #[test]
    fn splits_vs_line() {
        let m = parse_row("21:00\nArsenal vs Chelsea").unwrap();
        assert_eq!(m.home, "Arsenal");
        assert_eq!(m.away, "Chelsea");

        let m = parse_row("21:00\nReal Madrid VS Getafe").unwrap();
        assert_eq!(m.home, "Real Madrid");
        assert_eq!(m.away, "Getafe");
    }

    #[test]
    fn short_text_is_never_a_row() {
        assert_eq!(parse_row("1:00 A B").unwrap_err(), Reject::Length);
        assert_eq!(parse_row("").unwrap_err(), Reject::Length);
        assert_eq!(parse_row("20:45\nA\nB").unwrap_err(), Reject::Length);
    }

    #[test]
    fn long_text_is_rejected() {
        let text = format!("20:45\nArsenal\nChelsea\n{}", "x".repeat(MAX_ROW_CHARS));
        assert_eq!(parse_row(&text).unwrap_err(), Reject::Length);
    }

    #[test]
    fn junk_and_headers_are_rejected() {
        assert_eq!(parse_row("Login Time 20:45\nfoo\nbar").unwrap_err(), Reject::Junk);
        assert_eq!(parse_row("12:00 GMT+8\nfoo\nbar").unwrap_err(), Reject::Junk);
        assert_eq!(parse_row("Time\nEvent\n00:00 HDP O/U").unwrap_err(), Reject::Header);
        assert_eq!(parse_row("Arsenal\nChelsea\nno clock").unwrap_err(), Reject::NoTime);
    }

    #[test]
    fn needs_two_distinct_teams() {
        assert_eq!(parse_row("20:45\nArsenal\n1(25)A").unwrap_err(), Reject::NoTeams);
        assert_eq!(parse_row("20:45\nArsenal\nArsenal").unwrap_err(), Reject::NoTeams);
    }

    #[test]
    fn drops_status_numeric_and_odds_lines() {
        let m = parse_row("Live\n20:45\n2.5\n0/0.5\nLive Center\nLazio\nRoma\n(HT)\n0(-20)").unwrap();
        assert_eq!(m.home, "Lazio");
        assert_eq!(m.away, "Roma");
        assert_eq!(m.handicap, "0(-20)");
        assert_eq!(m.over_under, "2.5");
    }

    #[test]
    fn suffix_marks_handicap() {
        assert_eq!(
            classify_odds("1(25)A 2.5(10)"),
            ("1(25)A".to_string(), "2.5(10)".to_string())
        );
        // Suffixed token wins even when it comes second.
        assert_eq!(classify_odds("3(10) 0/0.5(50)H").0, "0/0.5(50)H");
    }

    #[test]
    fn unsuffixed_tokens_go_by_position() {
        assert_eq!(
            classify_odds("0/0.5(50) 2.5(-30)"),
            ("0/0.5(50)".to_string(), "2.5(-30)".to_string())
        );
        // Third token is ignored once both are set.
        assert_eq!(
            classify_odds("1(10) 3(20) 4(30)"),
            ("1(10)".to_string(), "3(20)".to_string())
        );
    }

    #[test]
    fn strips_trailing_over_under_letter() {
        assert_eq!(classify_odds("1(25)A 2.5(10)o").1, "2.5(10)");
        assert_eq!(classify_odds("1(25)A 3(5) U").1, "3(5)");
    }

    #[test]
    fn bare_total_fallback() {
        assert_eq!(classify_odds("1(25)A 3.5").1, "3.5");
        assert_eq!(classify_odds("1(25)A 4.5 Over").1, "4.5");
        assert_eq!(classify_odds("20:45 1(25)A").1, "");
        assert_eq!(classify_odds("nothing here").1, "");
        // Never duplicates the handicap.
        assert_eq!(classify_odds("3(10)"), ("3(10)".to_string(), String::new()));
    }
}
