//! Audit sections 1–8: the upstream data feeds.
//!
//! Each feed gets its own independently-addressable section covering
//! existence, parseability, freshness, structural completeness, cardinality,
//! value ranges, and name canonicality. Sections collect the parsed feeds
//! into [`CheckedFeeds`] so the downstream consistency and model sections
//! reuse them instead of re-reading disk.

use chrono::NaiveDateTime;
use serde_json::Value;

use super::{
    SECTION_BANKROLL, SECTION_IMPACT, SECTION_INJURIES, SECTION_NEWS, SECTION_ODDS,
    SECTION_RATINGS, SECTION_REST, SECTION_SCHEDULE,
};
use crate::config::BankrollConfig;
use crate::engine::status_weight;
use crate::feeds::{
    age_hours, parse_timestamp, split_timestamp_header, FeedKind, FeedStore, ImpactFeed,
    InjuriesFeed, NewsFeed, OddsFeed, RatingsFeed, RestFeed, ScheduleFeed,
};
use crate::teams;
use crate::types::{CheckResult, SectionReport};

// ---------------------------------------------------------------------------
// Expected value ranges
// ---------------------------------------------------------------------------

pub const PACE_RANGE: (f64, f64) = (92.0, 108.0);
pub const RATING_RANGE: (f64, f64) = (100.0, 125.0);
pub const NET_RATING_RANGE: (f64, f64) = (-20.0, 20.0);
/// Fair line and market line.
pub const SPREAD_RANGE: (f64, f64) = (-30.0, 30.0);
/// Raw per-player on/off values (bench players can be extreme).
pub const IMPACT_RANGE: (f64, f64) = (-30.0, 30.0);
pub const REST_RANGE: (f64, f64) = (-4.0, 4.0);
/// Quarter-Kelly percent.
pub const KELLY_RANGE: (f64, f64) = (0.0, 15.0);
/// Raw edge points (capped separately).
pub const EDGE_RANGE: (f64, f64) = (0.0, 30.0);

fn in_range(v: f64, range: (f64, f64)) -> bool {
    v >= range.0 && v <= range.1
}

/// Everything the feed sections managed to parse, for downstream sections.
#[derive(Default)]
pub struct CheckedFeeds {
    pub ratings: Option<RatingsFeed>,
    pub injuries: Option<InjuriesFeed>,
    pub impact: Option<ImpactFeed>,
    pub rest: Option<RestFeed>,
    pub odds: Option<OddsFeed>,
    pub schedule: Option<ScheduleFeed>,
    pub news: Option<NewsFeed>,
    pub bankroll: Option<BankrollConfig>,
}

/// Run all eight feed sections.
pub fn audit_feeds(store: &FeedStore, now: NaiveDateTime) -> (Vec<SectionReport>, CheckedFeeds) {
    let mut checked = CheckedFeeds::default();
    let mut sections = Vec::with_capacity(8);

    let (section, feed) = audit_ratings(store, now);
    checked.ratings = feed;
    sections.push(section);

    let (section, feed) = audit_injuries(store, now);
    checked.injuries = feed;
    sections.push(section);

    let (section, feed) = audit_impact(store, now);
    checked.impact = feed;
    sections.push(section);

    let (section, feed) = audit_rest(store, now);
    checked.rest = feed;
    sections.push(section);

    let (section, feed) = audit_odds(store, now);
    checked.odds = feed;
    sections.push(section);

    let (section, feed) = audit_schedule(store, now);
    checked.schedule = feed;
    sections.push(section);

    let (section, feed) = audit_news(store, now);
    checked.news = feed;
    sections.push(section);

    let (section, feed) = audit_bankroll(store);
    checked.bankroll = feed;
    sections.push(section);

    (sections, checked)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn freshness_check(
    id: &str,
    ts: Option<NaiveDateTime>,
    stale_hours: f64,
    now: NaiveDateTime,
    fix: &str,
) -> CheckResult {
    match ts {
        None => CheckResult::fail(id, "Timestamp missing or unparseable").with_fix(fix),
        Some(ts) => {
            let hrs = age_hours(ts, now);
            if hrs > stale_hours {
                CheckResult::warn(id, format!("Data is {hrs:.1}h old (stale > {stale_hours:.0}h)"))
                    .with_details(vec![format!("Last updated: {}", ts.format("%Y-%m-%d %H:%M:%S"))])
                    .with_fix(fix)
            } else {
                CheckResult::pass(id, format!("Fresh ({hrs:.1}h old)"))
            }
        }
    }
}

fn truncate_details(mut items: Vec<String>, max: usize) -> Vec<String> {
    if items.len() > max {
        let extra = items.len() - max;
        items.truncate(max);
        items.push(format!("... and {extra} more"));
    }
    items
}

fn fix_refresh(kind: FeedKind) -> String {
    format!("Refresh the {kind} feed: fairline fix (runs the configured collector)")
}

// ---------------------------------------------------------------------------
// 1. Team ratings
// ---------------------------------------------------------------------------

fn audit_ratings(store: &FeedStore, now: NaiveDateTime) -> (SectionReport, Option<RatingsFeed>) {
    let mut s = SectionReport::new(SECTION_RATINGS);
    let path = store.path(FeedKind::Ratings);
    let fix = fix_refresh(FeedKind::Ratings);

    if !path.exists() {
        s.push(CheckResult::fail("stats.exists", "File not found").with_fix(&fix));
        return (s, None);
    }
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            s.push(CheckResult::fail("stats.parse", format!("Unreadable: {e}")).with_fix(&fix));
            return (s, None);
        }
    };
    let value: Value = match serde_json::from_str(&contents) {
        Ok(v) => v,
        Err(e) => {
            s.push(
                CheckResult::fail("stats.parse", format!("JSON parse error: {e}")).with_fix(&fix),
            );
            return (s, None);
        }
    };
    s.push(CheckResult::pass("stats.parse", "JSON valid"));

    let ts = value
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);
    s.push(freshness_check("stats.freshness", ts, store.stale_hours, now, &fix));

    let rows = match value.get("teams").and_then(Value::as_array) {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            s.push(
                CheckResult::fail("stats.structure", "Missing or empty \"teams\" array")
                    .with_fix(&fix),
            );
            return (s, None);
        }
    };

    // Required columns, checked against every row so a single truncated
    // entry is caught too.
    const REQUIRED: [&str; 5] = ["team", "off_rating", "def_rating", "net_rating", "pace"];
    let mut missing_cols: Vec<&str> = Vec::new();
    for col in REQUIRED {
        if rows.iter().any(|row| row.get(col).is_none()) {
            missing_cols.push(col);
        }
    }
    if !missing_cols.is_empty() {
        s.push(
            CheckResult::fail("stats.columns", format!("Missing columns: {missing_cols:?}"))
                .with_fix("Source format may have changed - delete the cache and re-run the ratings collector"),
        );
        return (s, None);
    }
    s.push(CheckResult::pass(
        "stats.columns",
        format!("All {} required columns present", REQUIRED.len()),
    ));

    let feed = match crate::feeds::ratings::load(&path) {
        Ok(feed) => feed,
        Err(e) => {
            s.push(CheckResult::fail("stats.parse", format!("{e}")).with_fix(&fix));
            return (s, None);
        }
    };

    // Cardinality after alias normalization
    let canonical: std::collections::HashSet<String> =
        feed.teams.iter().map(|r| teams::canonicalize(&r.team)).collect();
    if canonical.len() == teams::TEAM_COUNT {
        s.push(CheckResult::pass("stats.team_count", "30 teams present"));
    } else {
        let missing: Vec<String> = teams::canonical_names()
            .into_iter()
            .filter(|n| !canonical.contains(*n))
            .map(String::from)
            .collect();
        s.push(
            CheckResult::fail(
                "stats.team_count",
                format!("{} teams (expected 30)", canonical.len()),
            )
            .with_details(truncate_details(missing, 5))
            .with_fix(&fix),
        );
    }

    // Alternate spellings are tolerated but worth knowing about
    if feed.teams.iter().any(|r| r.team == "LA Clippers") {
        s.push(CheckResult::warn(
            "stats.alias_names",
            "\"LA Clippers\" in raw cache - normalised at load time",
        ));
    }

    let unknown: Vec<String> = canonical
        .iter()
        .filter(|n| !teams::is_canonical(n))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        s.push(
            CheckResult::warn(
                "stats.unknown_teams",
                format!("Unexpected team names: {unknown:?}"),
            ),
        );
    }

    // Value ranges
    let mut outliers: Vec<String> = Vec::new();
    for r in &feed.teams {
        if !in_range(r.pace, PACE_RANGE) {
            outliers.push(format!("{}: pace={}", r.team, r.pace));
        }
        if !in_range(r.off_rating, RATING_RANGE) {
            outliers.push(format!("{}: off={}", r.team, r.off_rating));
        }
        if !in_range(r.def_rating, RATING_RANGE) {
            outliers.push(format!("{}: def={}", r.team, r.def_rating));
        }
        if !in_range(r.net_rating, NET_RATING_RANGE) {
            outliers.push(format!("{}: net={}", r.team, r.net_rating));
        }
    }
    if outliers.is_empty() {
        s.push(CheckResult::pass(
            "stats.value_ranges",
            "All pace/off/def/net values in expected ranges",
        ));
    } else {
        s.push(
            CheckResult::warn("stats.value_ranges", format!("{} outlier(s)", outliers.len()))
                .with_details(truncate_details(outliers, 5)),
        );
    }

    (s, Some(feed))
}

// ---------------------------------------------------------------------------
// 2. Injuries
// ---------------------------------------------------------------------------

fn audit_injuries(store: &FeedStore, now: NaiveDateTime) -> (SectionReport, Option<InjuriesFeed>) {
    let mut s = SectionReport::new(SECTION_INJURIES);
    let path = store.path(FeedKind::Injuries);
    let fix = fix_refresh(FeedKind::Injuries);

    if !path.exists() {
        s.push(CheckResult::fail("injuries.exists", "File not found").with_fix(&fix));
        return (s, None);
    }
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) if !c.trim().is_empty() => c,
        Ok(_) => {
            s.push(CheckResult::fail("injuries.empty", "File is empty").with_fix(&fix));
            return (s, None);
        }
        Err(e) => {
            s.push(CheckResult::fail("injuries.parse", format!("Unreadable: {e}")).with_fix(&fix));
            return (s, None);
        }
    };

    let (ts, body) = split_timestamp_header(&contents);
    s.push(freshness_check("injuries.freshness", ts, store.stale_hours, now, &fix));

    // Header columns before the typed parse, so a renamed column is
    // reported as a column problem rather than a row error.
    let header: Vec<String> = body
        .lines()
        .next()
        .map(|line| line.split(',').map(|c| c.trim().to_string()).collect())
        .unwrap_or_default();
    const REQUIRED: [&str; 3] = ["team", "player", "status"];
    let missing: Vec<&str> = REQUIRED
        .iter()
        .filter(|c| !header.iter().any(|h| h == *c))
        .copied()
        .collect();
    if !missing.is_empty() {
        s.push(
            CheckResult::fail("injuries.columns", format!("Missing columns: {missing:?}"))
                .with_details(vec![format!("Found: {header:?}")])
                .with_fix("Source format may have changed - check the injuries collector"),
        );
        return (s, None);
    }
    s.push(CheckResult::pass(
        "injuries.columns",
        format!("Required columns present: {REQUIRED:?}"),
    ));

    let feed = match crate::feeds::injuries::load(&path) {
        Ok(feed) => feed,
        Err(e) => {
            s.push(CheckResult::fail("injuries.parse", format!("{e}")).with_fix(&fix));
            return (s, None);
        }
    };

    if feed.records.is_empty() {
        s.push(CheckResult::warn(
            "injuries.empty",
            "No injury rows - is this correct? (healthy league?)",
        ));
        return (s, Some(feed));
    }
    s.push(CheckResult::pass(
        "injuries.parse",
        format!("{} injury records loaded", feed.records.len()),
    ));

    let team_names: std::collections::HashSet<String> =
        feed.records.iter().map(|r| teams::canonicalize(&r.team)).collect();
    s.push(if team_names.len() >= 20 {
        CheckResult::pass(
            "injuries.team_count",
            format!("{} teams have injuries", team_names.len()),
        )
    } else {
        CheckResult::warn(
            "injuries.team_count",
            format!("{} teams have injuries", team_names.len()),
        )
    });

    let bad_teams: Vec<String> = team_names
        .iter()
        .filter(|n| !teams::is_canonical(n))
        .cloned()
        .collect();
    if bad_teams.is_empty() {
        s.push(CheckResult::pass("injuries.team_names", "All team names are canonical"));
    } else {
        s.push(
            CheckResult::fail(
                "injuries.team_names",
                format!("Unknown team names: {bad_teams:?}"),
            )
            .with_details(vec![
                "These won't match model lookups".to_string(),
            ])
            .with_fix("Add the missing name(s) to the injuries collector's team map, then re-fetch"),
        );
    }

    // Empty or truncated player names
    let empty_names: Vec<String> = feed
        .records
        .iter()
        .filter(|r| r.player.trim().len() < 3)
        .map(|r| format!("{}: {:?}", r.team, r.player))
        .collect();
    if empty_names.is_empty() {
        s.push(CheckResult::pass("injuries.player_names", "All player names look valid"));
    } else {
        s.push(
            CheckResult::fail(
                "injuries.player_names",
                format!("{} player(s) with empty/short names", empty_names.len()),
            )
            .with_details(truncate_details(empty_names, 3))
            .with_fix("Source markup may have changed - check the injuries collector's selectors"),
        );
    }

    // Concatenated names (an old scraper bug produced "JohnSmithJaneDoe")
    let concat: Vec<String> = feed
        .records
        .iter()
        .filter(|r| r.player.len() > 30 && !r.player.contains(' '))
        .map(|r| format!("{}: {}", r.team, r.player))
        .collect();
    if !concat.is_empty() {
        s.push(
            CheckResult::fail(
                "injuries.concat_names",
                format!("{} possibly concatenated name(s)", concat.len()),
            )
            .with_details(truncate_details(concat, 3))
            .with_fix("Player name parsing broken - check the injuries collector"),
        );
    }

    // Status recognition
    let unrecognised: Vec<String> = feed
        .records
        .iter()
        .filter(|r| status_weight(&r.status) == 0.0)
        .map(|r| format!("{}: {:?}", r.player, r.status))
        .collect();
    if unrecognised.is_empty() {
        s.push(CheckResult::pass(
            "injuries.status_values",
            "All statuses contain recognised keywords",
        ));
    } else {
        s.push(
            CheckResult::warn(
                "injuries.status_values",
                format!("{} status(es) not matching known keywords", unrecognised.len()),
            )
            .with_details(truncate_details(unrecognised, 5)),
        );
    }

    (s, Some(feed))
}

// ---------------------------------------------------------------------------
// 3. Player impact
// ---------------------------------------------------------------------------

fn audit_impact(store: &FeedStore, now: NaiveDateTime) -> (SectionReport, Option<ImpactFeed>) {
    let mut s = SectionReport::new(SECTION_IMPACT);
    let path = store.path(FeedKind::Impact);
    let fix = fix_refresh(FeedKind::Impact);

    let feed = match crate::feeds::impact::load(&path) {
        Ok(feed) => {
            s.push(CheckResult::pass("impact.parse", "JSON valid"));
            feed
        }
        Err(crate::types::FairlineError::FeedMissing(_)) => {
            s.push(CheckResult::fail("impact.exists", "File not found").with_fix(&fix));
            return (s, None);
        }
        Err(e) => {
            s.push(CheckResult::fail("impact.parse", format!("{e}")).with_fix(&fix));
            return (s, None);
        }
    };

    s.push(freshness_check("impact.freshness", feed.timestamp, store.stale_hours, now, &fix));

    if feed.teams.is_empty() {
        s.push(CheckResult::fail("impact.structure", "No \"teams\" key or empty").with_fix(&fix));
        return (s, None);
    }

    if feed.teams.len() == teams::TEAM_COUNT {
        s.push(CheckResult::pass("impact.team_count", "30 teams in cache"));
    } else {
        s.push(
            CheckResult::fail(
                "impact.team_count",
                format!("{} teams in cache (expected 30)", feed.teams.len()),
            )
            .with_fix(&fix),
        );
    }

    // Keys must be valid team ids
    let bad_ids: Vec<String> = feed
        .teams
        .keys()
        .filter(|k| k.parse::<u32>().ok().and_then(teams::by_id).is_none())
        .cloned()
        .collect();
    if bad_ids.is_empty() {
        s.push(CheckResult::pass("impact.team_ids", "All team ids are valid"));
    } else {
        s.push(
            CheckResult::fail(
                "impact.team_ids",
                format!("{} invalid team id(s)", bad_ids.len()),
            )
            .with_details(truncate_details(bad_ids, 5))
            .with_fix("Check the impact collector - keys should be league team ids"),
        );
    }

    // Per-team collector errors
    let errors: Vec<String> = feed
        .teams
        .iter()
        .filter_map(|(id, t)| {
            t.error.as_ref().map(|e| {
                let name = id
                    .parse::<u32>()
                    .ok()
                    .and_then(teams::by_id)
                    .map(|t| t.full_name.to_string())
                    .unwrap_or_else(|| id.clone());
                format!("{name}: {e}")
            })
        })
        .collect();
    if errors.is_empty() {
        s.push(CheckResult::pass("impact.fetch_errors", "No team fetch errors"));
    } else {
        s.push(
            CheckResult::warn(
                "impact.fetch_errors",
                format!("{} team(s) had scrape errors", errors.len()),
            )
            .with_details(truncate_details(errors, 5)),
        );
    }

    let total = feed.total_players();
    s.push(if total >= 300 {
        CheckResult::pass("impact.player_count", format!("{total} player impact records"))
    } else {
        CheckResult::warn("impact.player_count", format!("{total} player impact records"))
    });

    let empty_rosters: Vec<String> = feed
        .teams
        .iter()
        .filter(|(_, t)| t.players.is_empty() && t.error.is_none())
        .map(|(id, _)| {
            id.parse::<u32>()
                .ok()
                .and_then(teams::by_id)
                .map(|t| t.full_name.to_string())
                .unwrap_or_else(|| id.clone())
        })
        .collect();
    if !empty_rosters.is_empty() {
        s.push(
            CheckResult::warn(
                "impact.empty_rosters",
                format!("{} team(s) with 0 players", empty_rosters.len()),
            )
            .with_details(truncate_details(empty_rosters, 5)),
        );
    }

    let outliers: Vec<String> = feed
        .teams
        .values()
        .flat_map(|t| t.players.iter())
        .filter(|(_, v)| !in_range(**v, IMPACT_RANGE))
        .map(|(name, v)| format!("{name}: {v}"))
        .collect();
    if outliers.is_empty() {
        s.push(CheckResult::pass(
            "impact.value_ranges",
            format!("All player impacts within [{}, {}]", IMPACT_RANGE.0, IMPACT_RANGE.1),
        ));
    } else {
        s.push(
            CheckResult::warn(
                "impact.value_ranges",
                format!("{} outlier impact value(s)", outliers.len()),
            )
            .with_details(truncate_details(outliers, 5)),
        );
    }

    (s, Some(feed))
}

// ---------------------------------------------------------------------------
// 4. Rest penalties
// ---------------------------------------------------------------------------

fn audit_rest(store: &FeedStore, now: NaiveDateTime) -> (SectionReport, Option<RestFeed>) {
    let mut s = SectionReport::new(SECTION_REST);
    let path = store.path(FeedKind::Rest);
    let fix = fix_refresh(FeedKind::Rest);

    let feed = match crate::feeds::rest::load(&path) {
        Ok(feed) => feed,
        Err(crate::types::FairlineError::FeedMissing(_)) => {
            s.push(CheckResult::fail("rest.exists", "File not found").with_fix(&fix));
            return (s, None);
        }
        Err(e) => {
            s.push(CheckResult::fail("rest.parse", format!("{e}")).with_fix(&fix));
            return (s, None);
        }
    };

    s.push(freshness_check("rest.freshness", feed.timestamp, store.stale_hours, now, &fix));

    if feed.penalties.is_empty() {
        s.push(CheckResult::fail("rest.empty", "No data rows").with_fix(&fix));
        return (s, None);
    }
    s.push(CheckResult::pass("rest.parse", format!("{} rows", feed.penalties.len())));

    let missing = feed.missing_teams();
    if missing.is_empty() {
        s.push(CheckResult::pass("rest.team_count", "30 teams present"));
    } else {
        s.push(
            CheckResult::fail(
                "rest.team_count",
                format!("{} teams (expected 30)", feed.penalties.len()),
            )
            .with_details(truncate_details(
                missing.iter().map(|m| m.to_string()).collect(),
                5,
            ))
            .with_fix("Backfill absent teams with penalty 0 or re-run the rest collector"),
        );
    }

    let bad: Vec<String> = feed
        .penalties
        .keys()
        .filter(|n| !teams::is_canonical(n))
        .cloned()
        .collect();
    if bad.is_empty() {
        s.push(CheckResult::pass("rest.team_names", "All canonical"));
    } else {
        s.push(
            CheckResult::fail("rest.team_names", format!("Non-canonical names: {bad:?}"))
                .with_fix("Add the missing name(s) to the rest collector's team map, then re-fetch"),
        );
    }

    let outliers: Vec<String> = feed
        .penalties
        .iter()
        .filter(|(_, v)| !in_range(**v, REST_RANGE))
        .map(|(t, v)| format!("{t}: {v}"))
        .collect();
    if outliers.is_empty() {
        s.push(CheckResult::pass(
            "rest.value_ranges",
            format!("All penalties within [{}, {}]", REST_RANGE.0, REST_RANGE.1),
        ));
    } else {
        s.push(
            CheckResult::warn("rest.value_ranges", format!("{} outlier(s)", outliers.len()))
                .with_details(truncate_details(outliers, 5)),
        );
    }

    let nonzero = feed.penalties.values().filter(|v| **v != 0.0).count();
    s.push(if nonzero > 0 {
        CheckResult::pass(
            "rest.b2b_teams",
            format!("{nonzero} team(s) have non-zero rest penalty"),
        )
    } else {
        CheckResult::warn(
            "rest.b2b_teams",
            "No team has a non-zero rest penalty (none on a back-to-back today?)",
        )
    });

    (s, Some(feed))
}

// ---------------------------------------------------------------------------
// 5. Odds
// ---------------------------------------------------------------------------

fn audit_odds(store: &FeedStore, now: NaiveDateTime) -> (SectionReport, Option<OddsFeed>) {
    let mut s = SectionReport::new(SECTION_ODDS);
    let path = store.path(FeedKind::Odds);
    let fix = fix_refresh(FeedKind::Odds);

    let feed = match crate::feeds::odds::load(&path) {
        Ok(feed) => {
            s.push(CheckResult::pass("odds.parse", "JSON valid"));
            feed
        }
        Err(crate::types::FairlineError::FeedMissing(_)) => {
            s.push(CheckResult::fail("odds.exists", "File not found").with_fix(&fix));
            return (s, None);
        }
        Err(e) => {
            s.push(CheckResult::fail("odds.parse", format!("{e}")).with_fix(&fix));
            return (s, None);
        }
    };

    if feed.games.is_empty() {
        s.push(
            CheckResult::fail("odds.games", "No \"games\" key or empty")
                .with_fix("Run the odds collector (check the API key in .env)"),
        );
        return (s, None);
    }
    s.push(CheckResult::pass(
        "odds.game_count",
        format!("{} games in cache", feed.games.len()),
    ));

    let mut issues: Vec<String> = Vec::new();
    for (key, game) in &feed.games {
        for (role, name) in [("away_full", &game.away_full), ("home_full", &game.home_full)] {
            if name.is_empty() {
                issues.push(format!("{key}: missing \"{role}\""));
            } else if !teams::is_canonical(&teams::canonicalize(name)) {
                issues.push(format!("{key}: {role}={name:?} not canonical"));
            }
        }
        match game.consensus_line {
            None => issues.push(format!("{key}: missing consensus line")),
            Some(line) if !in_range(line, SPREAD_RANGE) => {
                issues.push(format!("{key}: consensus_line={line} out of range"));
            }
            Some(_) => {}
        }
        if game.spreads.is_empty() {
            issues.push(format!("{key}: empty spreads"));
        } else if game.book_count() < 2 {
            issues.push(format!("{key}: only {} book(s) - thin market", game.book_count()));
        }
        if game.spread_variance() > 8.0 {
            issues.push(format!(
                "{key}: spread variance {:.1} pts - possible stale book",
                game.spread_variance()
            ));
        }
    }
    if issues.is_empty() {
        s.push(CheckResult::pass("odds.integrity", "All game entries well-formed"));
    } else {
        s.push(
            CheckResult::warn("odds.integrity", format!("{} issue(s)", issues.len()))
                .with_details(truncate_details(issues, 8)),
        );
    }

    s.push(freshness_check("odds.freshness", feed.latest_fetch(), store.stale_hours, now, &fix));

    (s, Some(feed))
}

// ---------------------------------------------------------------------------
// 6. Schedule
// ---------------------------------------------------------------------------

fn audit_schedule(store: &FeedStore, now: NaiveDateTime) -> (SectionReport, Option<ScheduleFeed>) {
    let mut s = SectionReport::new(SECTION_SCHEDULE);
    let path = store.path(FeedKind::Schedule);
    let fix = fix_refresh(FeedKind::Schedule);

    let feed = match crate::feeds::schedule::load(&path) {
        Ok(feed) => {
            s.push(CheckResult::pass("schedule.parse", "JSON valid"));
            feed
        }
        Err(crate::types::FairlineError::FeedMissing(_)) => {
            s.push(CheckResult::fail("schedule.exists", "File not found").with_fix(&fix));
            return (s, None);
        }
        Err(e) => {
            s.push(CheckResult::fail("schedule.parse", format!("{e}")).with_fix(&fix));
            return (s, None);
        }
    };

    s.push(freshness_check("schedule.freshness", feed.timestamp, store.stale_hours, now, &fix));

    if feed.dates.is_empty() {
        s.push(CheckResult::fail("schedule.dates", "No \"dates\" key or empty").with_fix(&fix));
        return (s, None);
    }
    s.push(CheckResult::pass(
        "schedule.dates",
        format!("{} date(s) cached", feed.dates.len()),
    ));

    let today_games = feed.games_on(now.date());
    if today_games.is_empty() {
        s.push(CheckResult::warn(
            "schedule.today",
            "No games found for today - off day or stale cache?",
        ));
    } else {
        s.push(CheckResult::pass(
            "schedule.today",
            format!("{} game(s) scheduled for today", today_games.len()),
        ));
        let bad: Vec<String> = today_games
            .iter()
            .flat_map(|g| [g.away.clone(), g.home.clone()])
            .filter(|n| !teams::is_canonical(&teams::canonicalize(n)))
            .collect();
        if bad.is_empty() {
            s.push(CheckResult::pass("schedule.team_names", "All schedule team names canonical"));
        } else {
            s.push(CheckResult::warn(
                "schedule.team_names",
                format!("Non-canonical names in schedule: {bad:?}"),
            ));
        }
    }

    (s, Some(feed))
}

// ---------------------------------------------------------------------------
// 7. News
// ---------------------------------------------------------------------------

fn audit_news(store: &FeedStore, now: NaiveDateTime) -> (SectionReport, Option<NewsFeed>) {
    let mut s = SectionReport::new(SECTION_NEWS);
    let path = store.path(FeedKind::News);
    let fix = fix_refresh(FeedKind::News);

    let feed = match crate::feeds::news::load(&path) {
        Ok(feed) => {
            s.push(CheckResult::pass("news.parse", "JSON valid"));
            feed
        }
        Err(crate::types::FairlineError::FeedMissing(_)) => {
            s.push(CheckResult::fail("news.exists", "File not found").with_fix(&fix));
            return (s, None);
        }
        Err(e) => {
            s.push(CheckResult::fail("news.parse", format!("{e}")).with_fix(&fix));
            return (s, None);
        }
    };

    s.push(freshness_check("news.freshness", feed.timestamp, store.stale_hours, now, &fix));

    if feed.articles.is_empty() {
        s.push(CheckResult::warn("news.articles", "No articles in cache"));
        return (s, Some(feed));
    }
    s.push(CheckResult::pass(
        "news.article_count",
        format!("{} articles", feed.articles.len()),
    ));

    let bad = feed
        .articles
        .iter()
        .filter(|a| a.title.trim().is_empty() || a.summary.trim().is_empty())
        .count();
    if bad == 0 {
        s.push(CheckResult::pass("news.structure", "All articles have title + summary"));
    } else {
        s.push(CheckResult::warn(
            "news.structure",
            format!("{bad} article(s) missing title/summary"),
        ));
    }

    (s, Some(feed))
}

// ---------------------------------------------------------------------------
// 8. Bankroll config
// ---------------------------------------------------------------------------

fn audit_bankroll(store: &FeedStore) -> (SectionReport, Option<BankrollConfig>) {
    let mut s = SectionReport::new(SECTION_BANKROLL);
    let path = store.path(FeedKind::Bankroll);

    if !path.exists() {
        s.push(CheckResult::fail("bankroll.exists", "File not found").with_fix(
            "Create bankroll.json with: {\"starting_bankroll\": 1000, \"unit_size\": 10, \"edge_cap\": 10}",
        ));
        return (s, None);
    }
    let value: Value = match std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|c| serde_json::from_str(&c).map_err(|e| e.to_string()))
    {
        Ok(v) => v,
        Err(e) => {
            s.push(
                CheckResult::fail("bankroll.parse", format!("JSON parse error: {e}"))
                    .with_fix("Fix the JSON syntax in bankroll.json or recreate it"),
            );
            return (s, None);
        }
    };
    s.push(CheckResult::pass("bankroll.parse", "JSON valid"));

    const FIELDS: [(&str, (f64, f64)); 3] = [
        ("starting_bankroll", (100.0, 100_000.0)),
        ("unit_size", (1.0, 1_000.0)),
        ("edge_cap", (1.0, 30.0)),
    ];
    for (field, range) in FIELDS {
        let id = format!("bankroll.{field}");
        match value.get(field) {
            None => s.push(
                CheckResult::fail(&id, format!("Missing \"{field}\" key"))
                    .with_fix(format!("Add \"{field}\" to bankroll.json")),
            ),
            Some(v) => match v.as_f64() {
                Some(n) if in_range(n, range) => {
                    s.push(CheckResult::pass(&id, format!("{field}={n}")));
                }
                Some(n) => {
                    s.push(CheckResult::warn(
                        &id,
                        format!("{field}={n} outside [{}, {}]", range.0, range.1),
                    ));
                }
                None => s.push(
                    CheckResult::fail(&id, format!("{field} non-numeric: {v}"))
                        .with_fix(format!("Fix \"{field}\" in bankroll.json to be a number")),
                ),
            },
        }
    }

    let config = serde_json::from_value::<BankrollConfig>(value).ok();
    (s, config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
