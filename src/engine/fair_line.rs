//! Fair line model.
//!
//! Builds a point-spread estimate from cached team efficiency, rest,
//! injury-weighted player impact, and late news. Layers stack onto a
//! positive-home-margin which is negated into line orientation at the end:
//! the returned fair line is negative when the home team is favored,
//! matching the market feed convention.
//!
//! The engine never fails. Any layer it cannot compute contributes zero and
//! is recorded as degraded; with nothing cached at all it falls back to
//! league-average baselines and returns a finite (low-confidence) number.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::feeds::Snapshot;
use crate::teams;
use crate::types::Confidence;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// League-average baselines used for regression and as the zero-data
/// fallback.
pub const LEAGUE_BASELINE_OFF: f64 = 112.0;
pub const LEAGUE_BASELINE_DEF: f64 = 112.0;
pub const LEAGUE_BASELINE_PACE: f64 = 99.5;

/// Model tuning knobs.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Weight on the observed rating vs the league baseline.
    pub regress_factor: f64,
    /// Home-court base, adjusted per-team by the net-rating split.
    pub base_home_court: f64,
    pub home_court_min: f64,
    pub home_court_max: f64,
    /// Per-player on/off ratings are clamped to ±this before weighting.
    pub impact_clamp: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            regress_factor: 0.75,
            base_home_court: 2.8,
            home_court_min: 1.5,
            home_court_max: 4.5,
            impact_clamp: 15.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Status weighting
// ---------------------------------------------------------------------------

/// Injury-status severity weights, matched case-insensitively as substrings
/// (the source site writes free text like "Out - ankle"). Specific phrases
/// are matched before the bare "out" keyword. Unrecognized statuses carry
/// no weight.
pub fn status_weight(status: &str) -> f64 {
    let s = status.to_lowercase();
    const TABLE: &[(&str, f64)] = &[
        ("out for the season", 1.0),
        ("doubtful", 0.8),
        ("game time decision", 0.5),
        ("game-time decision", 0.5),
        ("day-to-day", 0.5),
        ("day to day", 0.5),
        ("questionable", 0.4),
        ("probable", 0.1),
        ("out", 1.0),
    ];
    TABLE
        .iter()
        .find(|(kw, _)| s.contains(kw))
        .map(|(_, w)| *w)
        .unwrap_or(0.0)
}

/// Statuses that make a lineup volatile (could swing either way by tip-off).
fn is_volatile(status: &str) -> bool {
    let s = status.to_lowercase();
    ["questionable", "game time", "game-time", "doubtful", "day-to-day", "day to day"]
        .iter()
        .any(|kw| s.contains(kw))
}

/// Clamp a raw on/off rating into the usable band. Idempotent.
pub fn clamp_impact(raw: f64) -> f64 {
    raw.clamp(-15.0, 15.0)
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// A model layer that can degrade independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    Ratings,
    HomeCourt,
    Rest,
    StarTax,
    News,
}

impl Term {
    pub const ALL: &'static [Term] = &[
        Term::Ratings,
        Term::HomeCourt,
        Term::Rest,
        Term::StarTax,
        Term::News,
    ];
}

/// Full factor decomposition for one matchup, so every prediction can be
/// traced back to what drove it.
#[derive(Debug, Clone)]
pub struct FairLineBreakdown {
    pub away: String,
    pub home: String,
    /// (off_h − def_a) − (off_a − def_h) on regressed ratings.
    pub efficiency_diff: f64,
    pub pace_avg: f64,
    pub matchup_component: f64,
    pub home_court: f64,
    pub home_rest: f64,
    pub away_rest: f64,
    pub rest_term: f64,
    pub home_star_tax: f64,
    pub away_star_tax: f64,
    pub news_term: f64,
    pub news_hits: Vec<String>,
    /// Positive = home team is the stronger side by this many points.
    pub home_margin: f64,
    /// Line orientation: negative = home favored. Always finite.
    pub fair_line: f64,
    pub degraded: Vec<Term>,
    pub questionable_players: Vec<String>,
    pub confidence: Confidence,
}

impl FairLineBreakdown {
    pub fn is_degraded(&self, term: Term) -> bool {
        self.degraded.contains(&term)
    }

    /// Number of layers backed by real, fresh data.
    pub fn intact_terms(&self) -> usize {
        Term::ALL.len() - self.degraded.len()
    }
}

impl fmt::Display for FairLineBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} | fair {:+.2} (matchup {:+.2}, hca {:+.2}, rest {:+.2}, tax H{:+.2}/A{:+.2}, news {:+.2}) | conf {}",
            self.away,
            self.home,
            self.fair_line,
            self.matchup_component,
            self.home_court,
            self.rest_term,
            -self.home_star_tax,
            self.away_star_tax,
            self.news_term,
            self.confidence,
        )
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct FairLineEngine {
    config: ModelConfig,
}

impl FairLineEngine {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Estimate the fair line for a matchup from whatever the snapshot has.
    pub fn fair_line(&self, snap: &Snapshot, away: &str, home: &str) -> FairLineBreakdown {
        let away_name = teams::canonicalize(away);
        let home_name = teams::canonicalize(home);
        let mut degraded: Vec<Term> = Vec::new();

        // -- Efficiency differential + dynamic home court ------------------
        let ratings_pair = snap.ratings.as_ref().and_then(|feed| {
            match (feed.rating_for(&home_name), feed.rating_for(&away_name)) {
                (Some(h), Some(a)) => Some((h.clone(), a.clone())),
                _ => None,
            }
        });

        let (efficiency_diff, pace_avg, home_court) = match &ratings_pair {
            Some((h, a)) => {
                let regress = |r: f64, baseline: f64| {
                    r * self.config.regress_factor + baseline * (1.0 - self.config.regress_factor)
                };
                let h_off = regress(h.off_rating, LEAGUE_BASELINE_OFF);
                let h_def = regress(h.def_rating, LEAGUE_BASELINE_DEF);
                let a_off = regress(a.off_rating, LEAGUE_BASELINE_OFF);
                let a_def = regress(a.def_rating, LEAGUE_BASELINE_DEF);
                let diff = (h_off - a_def) - (a_off - h_def);
                let pace = (h.pace + a.pace) / 2.0;
                let hca = (self.config.base_home_court + (h.net_rating - a.net_rating) / 20.0)
                    .clamp(self.config.home_court_min, self.config.home_court_max);
                (diff, pace, hca)
            }
            None => {
                degraded.push(Term::Ratings);
                degraded.push(Term::HomeCourt);
                (0.0, LEAGUE_BASELINE_PACE, self.config.base_home_court)
            }
        };
        let matchup_component = efficiency_diff * (pace_avg / 100.0);

        // -- Rest ----------------------------------------------------------
        let (home_rest, away_rest) = match &snap.rest {
            Some(feed) => (feed.penalty_for(&home_name), feed.penalty_for(&away_name)),
            None => {
                degraded.push(Term::Rest);
                (0.0, 0.0)
            }
        };
        let rest_term = home_rest - away_rest;

        // -- Star tax ------------------------------------------------------
        let mut questionable_players: Vec<String> = Vec::new();
        let (home_star_tax, away_star_tax) = match (&snap.injuries, &snap.impact) {
            (Some(injuries), Some(impact)) => {
                let home_tax =
                    self.team_star_tax(&home_name, injuries, impact, &mut questionable_players);
                let away_tax =
                    self.team_star_tax(&away_name, injuries, impact, &mut questionable_players);
                match (home_tax, away_tax) {
                    (Some(h), Some(a)) => (h, a),
                    _ => {
                        degraded.push(Term::StarTax);
                        (home_tax.unwrap_or(0.0), away_tax.unwrap_or(0.0))
                    }
                }
            }
            _ => {
                degraded.push(Term::StarTax);
                (0.0, 0.0)
            }
        };

        // -- News ----------------------------------------------------------
        let mut news_hits: Vec<String> = Vec::new();
        let news_term = match &snap.news {
            Some(feed) => {
                let mut keywords: Vec<String> =
                    vec![home_name.to_lowercase(), away_name.to_lowercase()];
                for name in [&home_name, &away_name] {
                    if let Some(team) = teams::resolve(name) {
                        keywords.push(team.nickname.to_lowercase());
                    }
                }
                let mut factor = 0.0;
                for article in &feed.articles {
                    let text = article.text();
                    if !keywords.iter().any(|kw| text.contains(kw)) {
                        continue;
                    }
                    if text.contains("late scratch") {
                        factor -= 2.0;
                        news_hits.push(format!("Late scratch: {}", article.title));
                    }
                    if text.contains("coach fired") {
                        factor -= 1.0;
                        news_hits.push(format!("Coach fired: {}", article.title));
                    }
                }
                factor
            }
            None => {
                degraded.push(Term::News);
                0.0
            }
        };

        // -- Assemble ------------------------------------------------------
        // Home tax weakens the home side, away tax weakens the away side,
        // so they enter with opposite signs and one consistent convention.
        let home_margin =
            matchup_component + home_court + rest_term - home_star_tax + away_star_tax + news_term;
        let fair_line = round2(-home_margin);

        let volatile = questionable_players.len();
        let confidence = if volatile >= 2 || degraded.len() >= 2 {
            Confidence::Low
        } else if volatile == 1 || !degraded.is_empty() {
            Confidence::Medium
        } else {
            Confidence::High
        };

        debug!(
            away = %away_name,
            home = %home_name,
            fair_line,
            degraded = degraded.len(),
            confidence = %confidence,
            "Fair line computed"
        );

        FairLineBreakdown {
            away: away_name,
            home: home_name,
            efficiency_diff: round2(efficiency_diff),
            pace_avg: round2(pace_avg),
            matchup_component: round2(matchup_component),
            home_court: round2(home_court),
            home_rest,
            away_rest,
            rest_term,
            home_star_tax: round2(home_star_tax),
            away_star_tax: round2(away_star_tax),
            news_term,
            news_hits,
            home_margin: round2(home_margin),
            fair_line,
            degraded,
            questionable_players,
            confidence,
        }
    }

    /// Sum of clamped, status-weighted impacts over a team's injury list.
    /// `None` means the impact table for this team is unusable (collector
    /// error or unknown team id), which the caller reports as degradation.
    fn team_star_tax(
        &self,
        team_name: &str,
        injuries: &crate::feeds::InjuriesFeed,
        impact: &crate::feeds::ImpactFeed,
        questionable: &mut Vec<String>,
    ) -> Option<f64> {
        let team = teams::resolve(team_name)?;
        let team_injuries = injuries.for_team(team_name);
        for rec in &team_injuries {
            if is_volatile(&rec.status) {
                questionable.push(rec.player.clone());
            }
        }

        let table = impact.for_team_id(team.id)?;
        if table.error.is_some() {
            return None;
        }

        let mut tax = 0.0;
        for rec in team_injuries {
            let weight = status_weight(&rec.status);
            if weight == 0.0 {
                continue;
            }
            if let Some(raw) = impact.impact_for(team.id, &rec.player) {
                tax += clamp_impact(raw) * weight;
            }
        }
        Some(tax)
    }
}

impl Default for FairLineEngine {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::injuries::InjuryRecord;
    use crate::feeds::ratings::TeamRating;
    use crate::feeds::{ImpactFeed, InjuriesFeed, NewsFeed, RatingsFeed, RestFeed, Snapshot};
    use std::collections::HashMap;

    fn rating(team: &str, off: f64, def: f64, net: f64, pace: f64) -> TeamRating {
        TeamRating {
            team: team.to_string(),
            off_rating: off,
            def_rating: def,
            net_rating: net,
            pace,
        }
    }

    fn ratings_feed(teams: Vec<TeamRating>) -> RatingsFeed {
        RatingsFeed {
            timestamp: None,
            source: None,
            teams,
        }
    }

    fn injuries_feed(records: Vec<(&str, &str, &str)>) -> InjuriesFeed {
        InjuriesFeed {
            timestamp: None,
            records: records
                .into_iter()
                .map(|(team, player, status)| InjuryRecord {
                    team: team.to_string(),
                    player: player.to_string(),
                    status: status.to_string(),
                    date: String::new(),
                })
                .collect(),
        }
    }

    fn impact_feed(entries: Vec<(u32, Vec<(&str, f64)>)>) -> ImpactFeed {
        let mut teams = HashMap::new();
        for (id, players) in entries {
            teams.insert(
                id.to_string(),
                crate::feeds::impact::TeamImpact {
                    players: players
                        .into_iter()
                        .map(|(n, v)| (n.to_string(), v))
                        .collect(),
                    error: None,
                },
            );
        }
        ImpactFeed {
            timestamp: None,
            source: None,
            teams,
        }
    }

    fn rest_feed(entries: Vec<(&str, f64)>) -> RestFeed {
        RestFeed {
            timestamp: None,
            penalties: entries
                .into_iter()
                .map(|(t, p)| (t.to_string(), p))
                .collect(),
        }
    }

    /// Even matchup except the home team is clearly stronger.
    fn lopsided_snapshot() -> Snapshot {
        Snapshot {
            ratings: Some(ratings_feed(vec![
                rating("Boston Celtics", 124.0, 110.0, 14.0, 100.0),
                rating("Utah Jazz", 108.0, 112.0, -4.0, 100.0),
            ])),
            injuries: Some(injuries_feed(vec![])),
            impact: Some(impact_feed(vec![
                (1610612738, vec![]),
                (1610612762, vec![]),
            ])),
            rest: Some(rest_feed(vec![])),
            news: Some(NewsFeed {
                timestamp: None,
                articles: vec![],
            }),
        }
    }

    // -- status_weight --

    #[test]
    fn test_status_weight_case_insensitive() {
        assert_eq!(status_weight("OUT"), 1.0);
        assert_eq!(status_weight("out"), 1.0);
        assert_eq!(status_weight("Out - ankle"), 1.0);
        assert_eq!(status_weight("Out For The Season"), 1.0);
        assert_eq!(status_weight("Doubtful"), 0.8);
        assert_eq!(status_weight("Game Time Decision"), 0.5);
        assert_eq!(status_weight("Day-To-Day"), 0.5);
        assert_eq!(status_weight("Questionable - knee"), 0.4);
        assert_eq!(status_weight("Probable"), 0.1);
    }

    #[test]
    fn test_status_weight_unrecognized_is_zero() {
        assert_eq!(status_weight("Suspended"), 0.0);
        assert_eq!(status_weight(""), 0.0);
    }

    // -- clamp --

    #[test]
    fn test_clamp_impact_bounds() {
        assert_eq!(clamp_impact(50.0), 15.0);
        assert_eq!(clamp_impact(-50.0), -15.0);
        assert_eq!(clamp_impact(7.3), 7.3);
    }

    #[test]
    fn test_clamp_impact_idempotent() {
        for r in [-100.0, -15.0, -3.5, 0.0, 14.999, 15.0, 99.0] {
            assert_eq!(clamp_impact(clamp_impact(r)), clamp_impact(r));
        }
    }

    // -- engine --

    #[test]
    fn test_zero_feeds_still_finite() {
        let engine = FairLineEngine::default();
        let snap = Snapshot::default();
        let line = engine.fair_line(&snap, "Utah Jazz", "Boston Celtics");
        assert!(line.fair_line.is_finite());
        // Baselines alone: only the home-court base survives
        assert_eq!(line.fair_line, -2.8);
        assert_eq!(line.confidence, Confidence::Low);
        assert!(line.is_degraded(Term::Ratings));
        assert!(line.is_degraded(Term::StarTax));
    }

    #[test]
    fn test_unknown_team_degrades_not_errors() {
        let engine = FairLineEngine::default();
        let snap = lopsided_snapshot();
        let line = engine.fair_line(&snap, "Seattle SuperSonics", "Boston Celtics");
        assert!(line.fair_line.is_finite());
        assert!(line.is_degraded(Term::Ratings));
    }

    #[test]
    fn test_sign_contract_stronger_home_means_negative_line() {
        let engine = FairLineEngine::default();
        let line = engine.fair_line(&lopsided_snapshot(), "Utah Jazz", "Boston Celtics");
        assert!(
            line.fair_line < 0.0,
            "stronger home team must produce a negative (home-favored) line, got {}",
            line.fair_line
        );
        assert!(line.home_margin > 0.0);
        assert_eq!(line.confidence, Confidence::High);
    }

    #[test]
    fn test_sign_contract_stronger_away_means_positive_line() {
        let engine = FairLineEngine::default();
        let line = engine.fair_line(&lopsided_snapshot(), "Boston Celtics", "Utah Jazz");
        // Celtics visiting: away is much stronger, outweighing home court
        assert!(line.fair_line > 0.0, "got {}", line.fair_line);
    }

    #[test]
    fn test_home_court_is_dynamic_not_flat() {
        let engine = FairLineEngine::default();
        let even = Snapshot {
            ratings: Some(ratings_feed(vec![
                rating("Boston Celtics", 112.0, 112.0, 5.0, 99.0),
                rating("Utah Jazz", 112.0, 112.0, -5.0, 99.0),
            ])),
            ..Default::default()
        };
        let line = engine.fair_line(&even, "Utah Jazz", "Boston Celtics");
        // 2.8 + (5 − (−5))/20 = 3.3
        assert!((line.home_court - 3.3).abs() < 1e-9);

        let reversed = engine.fair_line(&even, "Boston Celtics", "Utah Jazz");
        // 2.8 + (−5 − 5)/20 = 2.3
        assert!((reversed.home_court - 2.3).abs() < 1e-9);
        assert_ne!(line.home_court, reversed.home_court);
    }

    #[test]
    fn test_home_court_clamped() {
        let engine = FairLineEngine::default();
        let extreme = Snapshot {
            ratings: Some(ratings_feed(vec![
                rating("Boston Celtics", 112.0, 112.0, 20.0, 99.0),
                rating("Utah Jazz", 112.0, 112.0, -20.0, 99.0),
            ])),
            ..Default::default()
        };
        let line = engine.fair_line(&extreme, "Utah Jazz", "Boston Celtics");
        // 2.8 + 40/20 = 4.8 → clamped to 4.5
        assert_eq!(line.home_court, 4.5);
    }

    #[test]
    fn test_rest_moves_line_against_tired_home_team() {
        let engine = FairLineEngine::default();
        let mut snap = lopsided_snapshot();
        let rested = engine.fair_line(&snap, "Utah Jazz", "Boston Celtics");

        snap.rest = Some(rest_feed(vec![("Boston Celtics", -2.0)]));
        let tired = engine.fair_line(&snap, "Utah Jazz", "Boston Celtics");

        assert_eq!(tired.rest_term, -2.0);
        // Tired home team → less negative (weaker home) line
        assert!(tired.fair_line > rested.fair_line);
    }

    #[test]
    fn test_star_tax_opposite_signs() {
        let engine = FairLineEngine::default();
        let base = lopsided_snapshot();
        let baseline = engine.fair_line(&base, "Utah Jazz", "Boston Celtics");

        // Home star out: home margin shrinks → line rises toward zero
        let mut home_hurt = lopsided_snapshot();
        home_hurt.injuries = Some(injuries_feed(vec![(
            "Boston Celtics",
            "Jayson Tatum",
            "Out - ankle",
        )]));
        home_hurt.impact = Some(impact_feed(vec![
            (1610612738, vec![("Jayson Tatum", 10.0)]),
            (1610612762, vec![]),
        ]));
        let hurt_home = engine.fair_line(&home_hurt, "Utah Jazz", "Boston Celtics");
        assert_eq!(hurt_home.home_star_tax, 10.0);
        assert!((hurt_home.fair_line - (baseline.fair_line + 10.0)).abs() < 1e-9);

        // Away star out: home margin grows → line falls further negative
        let mut away_hurt = lopsided_snapshot();
        away_hurt.injuries = Some(injuries_feed(vec![(
            "Utah Jazz",
            "Lauri Markkanen",
            "Out - back",
        )]));
        away_hurt.impact = Some(impact_feed(vec![
            (1610612738, vec![]),
            (1610612762, vec![("Lauri Markkanen", 8.0)]),
        ]));
        let hurt_away = engine.fair_line(&away_hurt, "Utah Jazz", "Boston Celtics");
        assert_eq!(hurt_away.away_star_tax, 8.0);
        assert!((hurt_away.fair_line - (baseline.fair_line - 8.0)).abs() < 1e-9);
    }

    #[test]
    fn test_star_tax_clamps_extreme_impact() {
        let engine = FairLineEngine::default();
        let mut snap = lopsided_snapshot();
        snap.injuries = Some(injuries_feed(vec![(
            "Boston Celtics",
            "Deep Benchwarmer",
            "Out",
        )]));
        snap.impact = Some(impact_feed(vec![
            (1610612738, vec![("Deep Benchwarmer", 28.4)]),
            (1610612762, vec![]),
        ]));
        let line = engine.fair_line(&snap, "Utah Jazz", "Boston Celtics");
        assert_eq!(line.home_star_tax, 15.0);
    }

    #[test]
    fn test_star_tax_weights_by_status() {
        let engine = FairLineEngine::default();
        let mut snap = lopsided_snapshot();
        snap.injuries = Some(injuries_feed(vec![(
            "Boston Celtics",
            "Jayson Tatum",
            "Questionable - ankle",
        )]));
        snap.impact = Some(impact_feed(vec![
            (1610612738, vec![("Jayson Tatum", 10.0)]),
            (1610612762, vec![]),
        ]));
        let line = engine.fair_line(&snap, "Utah Jazz", "Boston Celtics");
        assert_eq!(line.home_star_tax, 4.0); // 10 × 0.4
        assert_eq!(line.questionable_players, vec!["Jayson Tatum".to_string()]);
        assert_eq!(line.confidence, Confidence::Medium);
    }

    #[test]
    fn test_two_questionable_players_low_confidence() {
        let engine = FairLineEngine::default();
        let mut snap = lopsided_snapshot();
        snap.injuries = Some(injuries_feed(vec![
            ("Boston Celtics", "Jayson Tatum", "Questionable"),
            ("Utah Jazz", "Lauri Markkanen", "Game Time Decision"),
        ]));
        let line = engine.fair_line(&snap, "Utah Jazz", "Boston Celtics");
        assert_eq!(line.questionable_players.len(), 2);
        assert_eq!(line.confidence, Confidence::Low);
    }

    #[test]
    fn test_news_late_scratch_term() {
        let engine = FairLineEngine::default();
        let mut snap = lopsided_snapshot();
        snap.news = Some(NewsFeed {
            timestamp: None,
            articles: vec![crate::feeds::news::NewsArticle {
                title: "Late scratch: Celtics star out tonight".to_string(),
                summary: "Announced minutes before tip.".to_string(),
            }],
        });
        let line = engine.fair_line(&snap, "Utah Jazz", "Boston Celtics");
        assert_eq!(line.news_term, -2.0);
        assert_eq!(line.news_hits.len(), 1);
    }

    #[test]
    fn test_missing_player_impact_contributes_zero() {
        let engine = FairLineEngine::default();
        let mut snap = lopsided_snapshot();
        snap.injuries = Some(injuries_feed(vec![(
            "Boston Celtics",
            "Two-Way Contract Guy",
            "Out",
        )]));
        // Impact table exists but has no row for this player
        let line = engine.fair_line(&snap, "Utah Jazz", "Boston Celtics");
        assert_eq!(line.home_star_tax, 0.0);
        assert!(!line.is_degraded(Term::StarTax));
    }
}
