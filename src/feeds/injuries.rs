//! Injuries feed — scraped league-wide injury report.
//!
//! CSV with an optional `# timestamp:` comment line. Statuses are free text
//! from the source site; the engine matches them against known keywords
//! case-insensitively, so they are kept verbatim here.

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::{read_feed_file, split_timestamp_header, FeedKind};
use crate::teams;
use crate::types::FairlineError;

/// One injured (or possibly-out) player.
#[derive(Debug, Clone, Deserialize)]
pub struct InjuryRecord {
    pub team: String,
    pub player: String,
    pub status: String,
    #[serde(default)]
    pub date: String,
}

/// Parsed injuries cache.
#[derive(Debug, Clone)]
pub struct InjuriesFeed {
    pub timestamp: Option<NaiveDateTime>,
    pub records: Vec<InjuryRecord>,
}

impl InjuriesFeed {
    /// Records grouped by canonical team name.
    pub fn by_team(&self) -> HashMap<String, Vec<&InjuryRecord>> {
        let mut map: HashMap<String, Vec<&InjuryRecord>> = HashMap::new();
        for rec in &self.records {
            map.entry(teams::canonicalize(&rec.team)).or_default().push(rec);
        }
        map
    }

    /// Injuries for one team, resolved canonically.
    pub fn for_team(&self, name: &str) -> Vec<&InjuryRecord> {
        let canonical = teams::canonicalize(name);
        self.records
            .iter()
            .filter(|r| teams::canonicalize(&r.team) == canonical)
            .collect()
    }
}

pub fn load(path: &Path) -> Result<InjuriesFeed, FairlineError> {
    let contents = read_feed_file(path, FeedKind::Injuries)?;
    let (timestamp, body) = split_timestamp_header(&contents);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: InjuryRecord = result.map_err(|e| FairlineError::FeedMalformed {
            feed: FeedKind::Injuries.to_string(),
            message: e.to_string(),
        })?;
        records.push(record);
    }

    Ok(InjuriesFeed { timestamp, records })
}
