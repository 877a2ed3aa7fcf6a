use std::collections::HashSet;

use crate::model::RankingEntry;

pub const MAX_RANK: u8 = 30;

/// Table column captions that sit right under a position number.
const HEADER_WORDS: &[&str] = &["pl", "w", "d", "l", "pts", "gd"];

/// Scans the page text for a bare position (`1`..=`30`) immediately followed
/// by a team-looking line. The first entry per rank wins.
pub fn parse_rankings(league: &str, text: &str) -> Vec<RankingEntry> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for pair in lines.windows(2) {
        let Some(rank) = parse_rank(pair[0]) else {
            continue;
        };
        let team = pair[1];
        if !looks_like_team(team) || !seen.insert(rank) {
            continue;
        }
        out.push(RankingEntry {
            league: league.to_string(),
            rank,
            team_name: team.to_string(),
        });
    }
    out
}

fn parse_rank(line: &str) -> Option<u8> {
    if line.is_empty() || line.len() > 2 || !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let rank: u8 = line.parse().ok()?;
    (1..=MAX_RANK).contains(&rank).then_some(rank)
}

fn looks_like_team(line: &str) -> bool {
    line.chars().count() > 2
        && !leads_with_integer(line)
        && !HEADER_WORDS.contains(&line.to_lowercase().as_str())
}

/// `true` for "3rd", "-2", "+1 pts": anything whose prefix reads as an integer.
fn leads_with_integer(line: &str) -> bool {
    let s = line.trim_start();
    let s = s.strip_prefix(|c| c == '+' || c == '-').unwrap_or(s);
    s.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(entries: &[RankingEntry]) -> Vec<(u8, &str)> {
        entries.iter().map(|e| (e.rank, e.team_name.as_str())).collect()
    }

    #[test]
    fn pairs_positions_with_the_next_line() {
        let out = parse_rankings("Premier League", "1\nArsenal\nP\n2\nChelsea\n1\nLiverpool");
        assert_eq!(ranks(&out), vec![(1, "Arsenal"), (2, "Chelsea")]);
        assert!(out.iter().all(|e| e.league == "Premier League"));
    }

    #[test]
    fn rejects_out_of_range_positions() {
        let out = parse_rankings("L", "0\nNobody FC\n31\nToo Far\n30\nLast Place\n100\nCentury");
        assert_eq!(ranks(&out), vec![(30, "Last Place")]);
    }

    #[test]
    fn skips_headers_short_and_numeric_followers() {
        let text = "#\nTeam\n1\nPTS\n1\nGD\n2\nFC\n3\n3rd Place\n4\n-2\n5\n  Real Betis  \n";
        let out = parse_rankings("La Liga", text);
        assert_eq!(ranks(&out), vec![(5, "Real Betis")]);
    }

    #[test]
    fn rank_after_a_rejected_follower_can_still_match_later() {
        let out = parse_rankings("L", "1\nW\n1\nInter");
        assert_eq!(ranks(&out), vec![(1, "Inter")]);
    }

    #[test]
    fn last_line_alone_is_ignored() {
        assert!(parse_rankings("L", "Standings\n7").is_empty());
        assert!(parse_rankings("L", "").is_empty());
    }

    #[test]
    fn tolerates_crlf_and_padding() {
        let out = parse_rankings("L", " 1 \r\n\r\n  Bayern München \r\n");
        assert_eq!(ranks(&out), vec![(1, "Bayern München")]);
    }
}
