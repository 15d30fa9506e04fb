//! Rest penalty feed — back-to-back / fatigue adjustments per team.
//!
//! On a light schedule day the collector may only emit the teams actually
//! playing; `backfilled` completes the set to all 30 with a zero penalty,
//! which is the semantically correct default (no fatigue signal).

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::{read_feed_file, split_timestamp_header, FeedKind};
use crate::teams;
use crate::types::FairlineError;

#[derive(Debug, Clone, Deserialize)]
struct RestRow {
    team: String,
    penalty: f64,
}

/// Parsed rest penalty cache, keyed by canonical team name.
#[derive(Debug, Clone)]
pub struct RestFeed {
    pub timestamp: Option<NaiveDateTime>,
    pub penalties: HashMap<String, f64>,
}

impl RestFeed {
    /// Penalty for a team; absent teams contribute 0.
    pub fn penalty_for(&self, name: &str) -> f64 {
        self.penalties
            .get(&teams::canonicalize(name))
            .copied()
            .unwrap_or(0.0)
    }

    /// Canonical teams with no entry in the feed.
    pub fn missing_teams(&self) -> Vec<&'static str> {
        teams::canonical_names()
            .into_iter()
            .filter(|name| !self.penalties.contains_key(*name))
            .collect()
    }

    /// A copy with every canonical team present, absentees at penalty 0.
    pub fn backfilled(&self) -> RestFeed {
        let mut penalties = self.penalties.clone();
        for name in teams::canonical_names() {
            penalties.entry(name.to_string()).or_insert(0.0);
        }
        RestFeed {
            timestamp: self.timestamp,
            penalties,
        }
    }
}

pub fn load(path: &Path) -> Result<RestFeed, FairlineError> {
    let contents = read_feed_file(path, FeedKind::Rest)?;
    let (timestamp, body) = split_timestamp_header(&contents);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());
    let mut penalties = HashMap::new();
    for result in reader.deserialize() {
        let row: RestRow = result.map_err(|e| FairlineError::FeedMalformed {
            feed: FeedKind::Rest.to_string(),
            message: e.to_string(),
        })?;
        penalties.insert(teams::canonicalize(&row.team), row.penalty);
    }

    Ok(RestFeed { timestamp, penalties })
}
