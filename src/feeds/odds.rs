//! Odds feed — market point spreads per game across books.
//!
//! `consensus_line` and all per-book spreads are in home-team line
//! orientation: negative means the home team is favored.

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::{parse_timestamp, read_feed_file, FeedKind};
use crate::teams;
use crate::types::FairlineError;

/// Market state for one game.
#[derive(Debug, Clone, Deserialize)]
pub struct OddsGame {
    pub away: String,
    pub home: String,
    #[serde(default)]
    pub away_full: String,
    #[serde(default)]
    pub home_full: String,
    pub consensus_line: Option<f64>,
    #[serde(default)]
    pub spreads: HashMap<String, f64>,
    #[serde(default)]
    pub fetched_at: Option<String>,
}

impl OddsGame {
    pub fn book_count(&self) -> usize {
        self.spreads.len()
    }

    /// Spread range across books. A wide range usually means one stale book.
    pub fn spread_variance(&self) -> f64 {
        if self.spreads.is_empty() {
            return 0.0;
        }
        let lo = self.spreads.values().copied().fold(f64::INFINITY, f64::min);
        let hi = self.spreads.values().copied().fold(f64::NEG_INFINITY, f64::max);
        hi - lo
    }
}

#[derive(Debug, Deserialize)]
struct OddsFile {
    games: HashMap<String, OddsGame>,
}

/// Parsed odds cache.
#[derive(Debug, Clone)]
pub struct OddsFeed {
    pub games: HashMap<String, OddsGame>,
}

impl OddsFeed {
    /// Find a game by matchup, resolving both names canonically.
    pub fn find_game(&self, away: &str, home: &str) -> Option<&OddsGame> {
        let away = teams::canonicalize(away);
        let home = teams::canonicalize(home);
        self.games.values().find(|g| {
            teams::canonicalize(&g.away_full) == away && teams::canonicalize(&g.home_full) == home
        })
    }

    /// Consensus market line for a matchup.
    pub fn market_line(&self, away: &str, home: &str) -> Option<f64> {
        self.find_game(away, home).and_then(|g| g.consensus_line)
    }

    /// Timestamp of the freshest fetch across games.
    pub fn latest_fetch(&self) -> Option<NaiveDateTime> {
        self.games
            .values()
            .filter_map(|g| g.fetched_at.as_deref().and_then(parse_timestamp))
            .max()
    }
}

pub fn load(path: &Path) -> Result<OddsFeed, FairlineError> {
    let contents = read_feed_file(path, FeedKind::Odds)?;
    let file: OddsFile =
        serde_json::from_str(&contents).map_err(|e| FairlineError::FeedMalformed {
            feed: FeedKind::Odds.to_string(),
            message: e.to_string(),
        })?;
    Ok(OddsFeed { games: file.games })
}
