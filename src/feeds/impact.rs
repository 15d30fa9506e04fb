//! Player impact feed — per-player on/off net-rating swings.
//!
//! Keyed by team id because the collector walks team pages; player names
//! inside each team are the join key against the injury report. Raw values
//! can be extreme for low-minute players and are clamped by the engine,
//! not here.

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::{parse_timestamp, read_feed_file, FeedKind};
use crate::types::FairlineError;

/// One team's scraped player impact table.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TeamImpact {
    #[serde(default)]
    pub players: HashMap<String, f64>,
    /// Present when the collector failed for this team.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImpactFile {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    source: Option<String>,
    teams: HashMap<String, TeamImpact>,
}

/// Parsed player impact cache, keyed by team id string.
#[derive(Debug, Clone)]
pub struct ImpactFeed {
    pub timestamp: Option<NaiveDateTime>,
    pub source: Option<String>,
    pub teams: HashMap<String, TeamImpact>,
}

impl ImpactFeed {
    pub fn for_team_id(&self, team_id: u32) -> Option<&TeamImpact> {
        self.teams.get(&team_id.to_string())
    }

    /// Case-insensitive player lookup within a team.
    pub fn impact_for(&self, team_id: u32, player: &str) -> Option<f64> {
        self.for_team_id(team_id)?
            .players
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(player))
            .map(|(_, v)| *v)
    }

    pub fn total_players(&self) -> usize {
        self.teams.values().map(|t| t.players.len()).sum()
    }
}

pub fn load(path: &Path) -> Result<ImpactFeed, FairlineError> {
    let contents = read_feed_file(path, FeedKind::Impact)?;
    let file: ImpactFile =
        serde_json::from_str(&contents).map_err(|e| FairlineError::FeedMalformed {
            feed: FeedKind::Impact.to_string(),
            message: e.to_string(),
        })?;
    Ok(ImpactFeed {
        timestamp: file.timestamp.as_deref().and_then(parse_timestamp),
        source: file.source,
        teams: file.teams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(contents: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("fairline_impact_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&p, contents).unwrap();
        p
    }

    #[test]
    fn test_load_and_lookup() {
        let path = temp_file(
            r#"{
                "timestamp": "2026-02-19T06:00:00",
                "teams": {
                    "1610612738": {"players": {"Jayson Tatum": 9.8, "Jaylen Brown": 6.1}},
                    "1610612762": {"players": {}, "error": "page timed out"}
                }
            }"#,
        );
        let feed = load(&path).unwrap();
        assert_eq!(feed.total_players(), 2);
        assert_eq!(feed.impact_for(1610612738, "jayson tatum"), Some(9.8));
        assert_eq!(feed.impact_for(1610612738, "Nobody"), None);
        assert!(feed.for_team_id(1610612762).unwrap().error.is_some());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unknown_team_id() {
        let path = temp_file(r#"{"teams": {}}"#);
        let feed = load(&path).unwrap();
        assert!(feed.for_team_id(1610612738).is_none());
        std::fs::remove_file(&path).unwrap();
    }
}
