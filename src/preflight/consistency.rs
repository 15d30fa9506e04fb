//! Audit section 9: cross-feed referential consistency.
//!
//! Each feed can be individually healthy while disagreeing with the others
//! about team identity or coverage. These checks catch the disagreements
//! that historically produced silent lookup misses at prediction time.

use chrono::NaiveDate;

use super::feeds::CheckedFeeds;
use super::SECTION_CONSISTENCY;
use crate::teams;
use crate::types::{CheckResult, SectionReport};

pub fn audit_consistency(checked: &CheckedFeeds, today: NaiveDate) -> SectionReport {
    let mut s = SectionReport::new(SECTION_CONSISTENCY);

    // Injury teams must exist in the ratings set
    if let (Some(injuries), Some(ratings)) = (&checked.injuries, &checked.ratings) {
        let rating_teams: std::collections::HashSet<String> = ratings
            .teams
            .iter()
            .map(|r| teams::canonicalize(&r.team))
            .collect();
        let orphans: Vec<String> = injuries
            .by_team()
            .keys()
            .filter(|t| !rating_teams.contains(*t))
            .cloned()
            .collect();
        if orphans.is_empty() {
            s.push(CheckResult::pass(
                "cross.injury_vs_ratings",
                "All injury teams match ratings teams",
            ));
        } else {
            s.push(
                CheckResult::fail(
                    "cross.injury_vs_ratings",
                    format!("{} injury team(s) don't match the ratings cache", orphans.len()),
                )
                .with_details(orphans.into_iter().take(5).collect())
                .with_fix("Collector team maps disagree - align them with the canonical team table"),
            );
        }
    }

    // Odds full names must be canonical
    if let Some(odds) = &checked.odds {
        let orphans: Vec<String> = odds
            .games
            .values()
            .flat_map(|g| [g.away_full.clone(), g.home_full.clone()])
            .filter(|n| !n.is_empty() && !teams::is_canonical(&teams::canonicalize(n)))
            .collect();
        if orphans.is_empty() {
            s.push(CheckResult::pass("cross.odds_team_names", "All odds teams canonical"));
        } else {
            s.push(
                CheckResult::fail(
                    "cross.odds_team_names",
                    format!("Odds has non-canonical names: {orphans:?}"),
                )
                .with_fix("Check the odds collector's name mapping against the canonical team table"),
            );
        }
    }

    // Every scheduled game should have odds
    if let (Some(schedule), Some(odds)) = (&checked.schedule, &checked.odds) {
        let today_games = schedule.games_on(today);
        if !today_games.is_empty() {
            let missing: Vec<String> = today_games
                .iter()
                .filter(|g| odds.find_game(&g.away, &g.home).is_none())
                .map(|g| format!("{} @ {}", g.away, g.home))
                .collect();
            if missing.is_empty() {
                s.push(CheckResult::pass(
                    "cross.schedule_vs_odds",
                    format!("All {} scheduled games have odds data", today_games.len()),
                ));
            } else {
                s.push(
                    CheckResult::warn(
                        "cross.schedule_vs_odds",
                        format!("{} scheduled game(s) without odds", missing.len()),
                    )
                    .with_details(missing.into_iter().take(5).collect()),
                );
            }
        }
    }

    // Every team playing today should have player impact data
    if let (Some(schedule), Some(impact)) = (&checked.schedule, &checked.impact) {
        let today_games = schedule.games_on(today);
        if !today_games.is_empty() {
            let mut missing: Vec<String> = Vec::new();
            for game in &today_games {
                for name in [&game.away, &game.home] {
                    if let Some(team) = teams::resolve(name) {
                        if impact.for_team_id(team.id).is_none() {
                            missing.push(format!("{} (id {})", team.full_name, team.id));
                        }
                    }
                }
            }
            missing.sort();
            missing.dedup();
            if missing.is_empty() {
                s.push(CheckResult::pass(
                    "cross.schedule_vs_impact",
                    "All of today's teams have impact data",
                ));
            } else {
                s.push(
                    CheckResult::warn(
                        "cross.schedule_vs_impact",
                        format!("{} team(s) playing today not in the impact cache", missing.len()),
                    )
                    .with_details(missing.into_iter().take(5).collect()),
                );
            }
        }
    }

    s
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
