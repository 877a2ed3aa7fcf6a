use serde::{Deserialize, Serialize};

/// One scheduled match with its odds lines, as shown on the bookmaker page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOdds {
    /// Kickoff, `H:MM` or `HH:MM`.
    pub time: String,
    pub home: String,
    pub away: String,
    pub handicap: String,
    pub over_under: String,
    /// Joined row text the record was parsed from.
    pub raw: String,
}

impl MatchOdds {
    /// Identity across frames: `time-home-away`.
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.time, self.home, self.away)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_names() {
        let m = MatchOdds {
            time: "20:45".into(),
            home: "Arsenal".into(),
            away: "Chelsea".into(),
            handicap: "1(25)A".into(),
            over_under: "2.5(10)".into(),
            raw: "20:45 Arsenal Chelsea 1(25)A 2.5(10)".into(),
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["overUnder"], "2.5(10)");
        assert_eq!(v["home"], "Arsenal");
        assert_eq!(m.key(), "20:45-Arsenal-Chelsea");
    }
}
