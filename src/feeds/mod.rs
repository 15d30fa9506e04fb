//! Feed cache access.
//!
//! Each upstream collector writes one cache file into the data directory;
//! this module provides typed, read-only loaders for them. Loaders classify
//! problems as `FeedMissing`/`FeedMalformed` so the auditor can report them;
//! the prediction path instead uses `FeedStore::snapshot`, which swallows
//! load failures and lets the engine degrade.

pub mod ratings;
pub mod injuries;
pub mod impact;
pub mod rest;
pub mod odds;
pub mod schedule;
pub mod news;

use chrono::{NaiveDateTime, TimeDelta};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::FairlineError;

pub use impact::ImpactFeed;
pub use injuries::InjuriesFeed;
pub use news::NewsFeed;
pub use odds::OddsFeed;
pub use ratings::RatingsFeed;
pub use rest::RestFeed;
pub use schedule::ScheduleFeed;

// ---------------------------------------------------------------------------
// Feed identity
// ---------------------------------------------------------------------------

/// The named artifacts the collectors maintain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Ratings,
    Injuries,
    Impact,
    Rest,
    Odds,
    Schedule,
    News,
    Bankroll,
}

impl FeedKind {
    pub const ALL: &'static [FeedKind] = &[
        FeedKind::Ratings,
        FeedKind::Injuries,
        FeedKind::Impact,
        FeedKind::Rest,
        FeedKind::Odds,
        FeedKind::Schedule,
        FeedKind::News,
        FeedKind::Bankroll,
    ];

    /// Cache file name inside the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            FeedKind::Ratings => "team_ratings.json",
            FeedKind::Injuries => "injuries.csv",
            FeedKind::Impact => "player_impact.json",
            FeedKind::Rest => "rest_penalties.csv",
            FeedKind::Odds => "odds.json",
            FeedKind::Schedule => "schedule.json",
            FeedKind::News => "news.json",
            FeedKind::Bankroll => "bankroll.json",
        }
    }

    /// Key used for collector lookup in the `[collectors]` config table.
    pub fn collector_key(&self) -> &'static str {
        match self {
            FeedKind::Ratings => "ratings",
            FeedKind::Injuries => "injuries",
            FeedKind::Impact => "impact",
            FeedKind::Rest => "rest",
            FeedKind::Odds => "odds",
            FeedKind::Schedule => "schedule",
            FeedKind::News => "news",
            FeedKind::Bankroll => "bankroll",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collector_key())
    }
}

// ---------------------------------------------------------------------------
// Timestamp helpers
// ---------------------------------------------------------------------------

/// Parse a cache timestamp. The collectors have written several formats over
/// time, so all of them are accepted. Trailing UTC offsets are stripped.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "Unknown" || raw == "Missing" {
        return None;
    }
    let clean = raw.split('+').next().unwrap_or(raw).trim_end_matches('Z');
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(clean, fmt).ok())
}

/// Age of a timestamp in hours relative to `now`.
pub fn age_hours(ts: NaiveDateTime, now: NaiveDateTime) -> f64 {
    let delta: TimeDelta = now - ts;
    delta.num_seconds() as f64 / 3600.0
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Read-only view over the data directory.
#[derive(Debug, Clone)]
pub struct FeedStore {
    data_dir: PathBuf,
    pub stale_hours: f64,
}

/// Everything the prediction engine consumes, loaded best-effort.
/// A `None` feed degrades the corresponding model term to zero.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub ratings: Option<RatingsFeed>,
    pub injuries: Option<InjuriesFeed>,
    pub impact: Option<ImpactFeed>,
    pub rest: Option<RestFeed>,
    pub news: Option<NewsFeed>,
}

impl FeedStore {
    pub fn new(data_dir: impl Into<PathBuf>, stale_hours: f64) -> Self {
        Self {
            data_dir: data_dir.into(),
            stale_hours,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, kind: FeedKind) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }

    pub fn ratings(&self) -> Result<RatingsFeed, FairlineError> {
        ratings::load(&self.path(FeedKind::Ratings))
    }

    pub fn injuries(&self) -> Result<InjuriesFeed, FairlineError> {
        injuries::load(&self.path(FeedKind::Injuries))
    }

    pub fn impact(&self) -> Result<ImpactFeed, FairlineError> {
        impact::load(&self.path(FeedKind::Impact))
    }

    pub fn rest(&self) -> Result<RestFeed, FairlineError> {
        rest::load(&self.path(FeedKind::Rest))
    }

    pub fn odds(&self) -> Result<OddsFeed, FairlineError> {
        odds::load(&self.path(FeedKind::Odds))
    }

    pub fn schedule(&self) -> Result<ScheduleFeed, FairlineError> {
        schedule::load(&self.path(FeedKind::Schedule))
    }

    pub fn news(&self) -> Result<NewsFeed, FairlineError> {
        news::load(&self.path(FeedKind::News))
    }

    /// Load the feeds the model consumes, tolerating any subset being
    /// absent or broken. Failures are logged and become degraded terms.
    pub fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::default();
        match self.ratings() {
            Ok(f) => snap.ratings = Some(f),
            Err(e) => debug!(error = %e, "Ratings feed unavailable"),
        }
        match self.injuries() {
            Ok(f) => snap.injuries = Some(f),
            Err(e) => debug!(error = %e, "Injuries feed unavailable"),
        }
        match self.impact() {
            Ok(f) => snap.impact = Some(f),
            Err(e) => debug!(error = %e, "Player impact feed unavailable"),
        }
        match self.rest() {
            Ok(f) => snap.rest = Some(f),
            Err(e) => debug!(error = %e, "Rest penalty feed unavailable"),
        }
        match self.news() {
            Ok(f) => snap.news = Some(f),
            Err(e) => debug!(error = %e, "News feed unavailable"),
        }
        snap
    }
}

// ---------------------------------------------------------------------------
// Shared loader plumbing
// ---------------------------------------------------------------------------

pub(crate) fn read_feed_file(path: &Path, feed: FeedKind) -> Result<String, FairlineError> {
    if !path.exists() {
        return Err(FairlineError::FeedMissing(feed.to_string()));
    }
    std::fs::read_to_string(path).map_err(|e| FairlineError::FeedMalformed {
        feed: feed.to_string(),
        message: e.to_string(),
    })
}

/// Split an optional leading `# timestamp: <ts>` comment line off a CSV
/// cache, returning the parsed timestamp and the remaining CSV body.
pub(crate) fn split_timestamp_header(contents: &str) -> (Option<NaiveDateTime>, &str) {
    if let Some(first_line) = contents.lines().next() {
        if let Some(rest) = first_line.strip_prefix('#') {
            let ts = rest
                .split_once(':')
                .map(|(_, v)| v.trim())
                .and_then(parse_timestamp);
            let body_start = contents.find('\n').map(|i| i + 1).unwrap_or(contents.len());
            return (ts, &contents[body_start..]);
        }
    }
    (None, contents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
