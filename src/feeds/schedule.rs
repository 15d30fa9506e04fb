//! Schedule feed — per-date game lists, prefetched fully offline.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::{parse_timestamp, read_feed_file, FeedKind};
use crate::types::FairlineError;

/// One scheduled game.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledGame {
    pub away: String,
    pub home: String,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateEntry {
    #[serde(default)]
    pub games: Vec<ScheduledGame>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScheduleFile {
    #[serde(default)]
    timestamp: Option<String>,
    dates: HashMap<String, DateEntry>,
}

/// Parsed schedule cache.
#[derive(Debug, Clone)]
pub struct ScheduleFeed {
    pub timestamp: Option<NaiveDateTime>,
    pub dates: HashMap<String, DateEntry>,
}

impl ScheduleFeed {
    /// Games scheduled on a date (empty when the date isn't cached).
    pub fn games_on(&self, date: NaiveDate) -> Vec<&ScheduledGame> {
        self.dates
            .get(&date.format("%Y-%m-%d").to_string())
            .map(|e| e.games.iter().collect())
            .unwrap_or_default()
    }
}

pub fn load(path: &Path) -> Result<ScheduleFeed, FairlineError> {
    let contents = read_feed_file(path, FeedKind::Schedule)?;
    let file: ScheduleFile =
        serde_json::from_str(&contents).map_err(|e| FairlineError::FeedMalformed {
            feed: FeedKind::Schedule.to_string(),
            message: e.to_string(),
        })?;
    Ok(ScheduleFeed {
        timestamp: file.timestamp.as_deref().and_then(parse_timestamp),
        dates: file.dates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(contents: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("fairline_schedule_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&p, contents).unwrap();
        p
    }

    #[test]
    fn test_games_on_date() {
        let path = temp_file(
            r#"{
                "timestamp": "2026-02-19 05:00:00",
                "dates": {
                    "2026-02-19": {
                        "games": [
                            {"away": "Utah Jazz", "home": "Boston Celtics", "time": "7:30 PM"}
                        ],
                        "source": "league-site"
                    }
                }
            }"#,
        );
        let feed = load(&path).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 2, 19).unwrap();
        assert_eq!(feed.games_on(day).len(), 1);
        assert!(feed
            .games_on(NaiveDate::from_ymd_opt(2026, 2, 20).unwrap())
            .is_empty());
        std::fs::remove_file(&path).unwrap();
    }
}
