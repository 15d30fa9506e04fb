//! Team ratings feed — advanced efficiency numbers per team.
//!
//! The collector scrapes the league stats endpoint and writes
//! `team_ratings.json`. One row per canonical team; "LA Clippers" style
//! spellings are normalized at load time.

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::{parse_timestamp, read_feed_file, FeedKind};
use crate::teams;
use crate::types::FairlineError;

/// One team's efficiency profile.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamRating {
    pub team: String,
    pub off_rating: f64,
    pub def_rating: f64,
    pub net_rating: f64,
    pub pace: f64,
}

#[derive(Debug, Deserialize)]
struct RatingsFile {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    source: Option<String>,
    teams: Vec<TeamRating>,
}

/// Parsed ratings cache.
#[derive(Debug, Clone)]
pub struct RatingsFeed {
    pub timestamp: Option<NaiveDateTime>,
    pub source: Option<String>,
    pub teams: Vec<TeamRating>,
}

impl RatingsFeed {
    /// Ratings keyed by canonical team name.
    pub fn by_team(&self) -> HashMap<String, &TeamRating> {
        self.teams
            .iter()
            .map(|r| (teams::canonicalize(&r.team), r))
            .collect()
    }

    /// Rating for one team, resolved through the canonical name service.
    pub fn rating_for(&self, name: &str) -> Option<&TeamRating> {
        let canonical = teams::canonicalize(name);
        self.teams
            .iter()
            .find(|r| teams::canonicalize(&r.team) == canonical)
    }
}

pub fn load(path: &Path) -> Result<RatingsFeed, FairlineError> {
    let contents = read_feed_file(path, FeedKind::Ratings)?;
    let file: RatingsFile =
        serde_json::from_str(&contents).map_err(|e| FairlineError::FeedMalformed {
            feed: FeedKind::Ratings.to_string(),
            message: e.to_string(),
        })?;
    Ok(RatingsFeed {
        timestamp: file.timestamp.as_deref().and_then(parse_timestamp),
        source: file.source,
        teams: file.teams,
    })
}
