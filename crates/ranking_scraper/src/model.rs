use serde::{Deserialize, Serialize};

/// One table position. At most one entry per `(league, rank)` in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub league: String,
    pub rank: u8,
    pub team_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingLeague {
    pub name: String,
    pub url: String,
}

impl RankingLeague {
    pub fn new(name: &str, url: &str) -> Self {
        Self { name: name.to_string(), url: url.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_team_name_in_camel_case() {
        let e = RankingEntry { league: "Serie A".into(), rank: 4, team_name: "Juventus".into() };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v, serde_json::json!({"league": "Serie A", "rank": 4, "teamName": "Juventus"}));
    }
}
