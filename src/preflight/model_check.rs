//! Audit section 10: model output spot-check.
//!
//! Runs the real prediction and staking path on a bounded sample of today's
//! scheduled games and asserts the outputs are well-formed. This catches the
//! class of failure where every feed is individually plausible but the
//! assembled model produces garbage.

use chrono::NaiveDate;

use super::feeds::{CheckedFeeds, EDGE_RANGE, KELLY_RANGE, SPREAD_RANGE};
use super::SECTION_MODEL;
use crate::config::DEFAULT_EDGE_CAP;
use crate::engine::{FairLineEngine, ModelConfig, Term};
use crate::feeds::Snapshot;
use crate::strategy::edge::EdgeCalculator;
use crate::strategy::kelly::KellyCalculator;
use crate::types::{CheckResult, SectionReport};

pub fn audit_model(checked: &CheckedFeeds, today: NaiveDate, limit: usize) -> SectionReport {
    let mut s = SectionReport::new(SECTION_MODEL);

    let today_games: Vec<(String, String)> = checked
        .schedule
        .as_ref()
        .map(|f| {
            f.games_on(today)
                .iter()
                .map(|g| (g.away.clone(), g.home.clone()))
                .collect()
        })
        .unwrap_or_default();

    if today_games.is_empty() {
        s.push(CheckResult::warn("model.no_games", "No games to spot-check"));
        return s;
    }

    if checked.ratings.is_some() {
        s.push(CheckResult::pass(
            "model.ratings_load",
            format!(
                "{} teams in the ratings feed",
                checked.ratings.as_ref().map(|r| r.teams.len()).unwrap_or(0)
            ),
        ));
    } else {
        s.push(
            CheckResult::fail("model.ratings_load", "Ratings feed unavailable for the model")
                .with_fix("Refresh the ratings feed: fairline fix"),
        );
        // Continue anyway: the engine must still produce finite output
        // from baselines, and that is itself worth checking.
    }

    let snapshot = Snapshot {
        ratings: checked.ratings.clone(),
        injuries: checked.injuries.clone(),
        impact: checked.impact.clone(),
        rest: checked.rest.clone(),
        news: checked.news.clone(),
    };
    let engine = FairLineEngine::new(ModelConfig::default());
    let edge_cap = checked
        .bankroll
        .as_ref()
        .map(|b| b.edge_cap)
        .unwrap_or(DEFAULT_EDGE_CAP);
    let edges = EdgeCalculator::new(edge_cap);
    let kelly = KellyCalculator::default();

    let mut games_checked = 0;
    let mut issues: Vec<String> = Vec::new();

    for (away, home) in today_games.iter().take(limit) {
        let tag = format!("{away} @ {home}");
        let breakdown = engine.fair_line(&snapshot, away, home);
        games_checked += 1;

        if !breakdown.fair_line.is_finite() {
            issues.push(format!("{tag}: fair line not finite"));
            continue;
        }
        if breakdown.fair_line < SPREAD_RANGE.0 || breakdown.fair_line > SPREAD_RANGE.1 {
            issues.push(format!("{tag}: fair_line={} out of range", breakdown.fair_line));
        }
        if breakdown.is_degraded(Term::StarTax) {
            issues.push(format!("{tag}: star tax degraded (impact data unusable)"));
        }

        let market = checked
            .odds
            .as_ref()
            .and_then(|o| o.market_line(away, home));
        if let Some(market) = market {
            let assessment = edges.assess(breakdown.fair_line, market, breakdown.confidence);
            if assessment.raw_edge < EDGE_RANGE.0 || assessment.raw_edge > EDGE_RANGE.1 {
                issues.push(format!("{tag}: edge={} out of range", assessment.raw_edge));
            }
            let stake = kelly.stake_percent(assessment.edge);
            if stake < KELLY_RANGE.0 || stake > KELLY_RANGE.1 {
                issues.push(format!("{tag}: kelly={stake}% out of range"));
            }
        }
    }

    if issues.is_empty() {
        s.push(CheckResult::pass(
            "model.spot_check",
            format!("{games_checked} game(s) checked, all clean"),
        ));
    } else {
        s.push(
            CheckResult::warn(
                "model.spot_check",
                format!("{games_checked} game(s) checked, {} issue(s)", issues.len()),
            )
            .with_details(issues.into_iter().take(8).collect()),
        );
    }

    s
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
