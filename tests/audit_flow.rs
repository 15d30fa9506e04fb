//! End-to-end audit flow over a fixture data directory.
//!
//! Builds a complete, healthy set of feed caches on disk, runs the full
//! audit, and exercises the stamping, auto-inheritance, and backfill paths
//! the way the operator would over a game day.

use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

use fairline::config::AppConfig;
use fairline::feeds::FeedKind;
use fairline::ledger::{self, WagerRecord};
use fairline::preflight::{self, AuditMode, Auditor};
use fairline::storage;
use fairline::teams;
use fairline::types::CheckStatus;

fn fixture_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 19)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn temp_data_dir() -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("fairline_flow_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&p).unwrap();
    p
}

/// Write a complete, fresh, internally consistent set of feed caches.
fn write_healthy_feeds(dir: &Path) {
    // Team ratings: all 30 canonical teams
    let rows: Vec<String> = teams::canonical_names()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            format!(
                r#"{{"team": "{name}", "off_rating": {:.1}, "def_rating": {:.1}, "net_rating": {:.1}, "pace": {:.1}}}"#,
                110.0 + (i % 10) as f64,
                110.0 + ((i + 5) % 10) as f64,
                (i as f64 % 10.0) - 5.0,
                96.0 + (i % 8) as f64,
            )
        })
        .collect();
    std::fs::write(
        dir.join("team_ratings.json"),
        format!(
            r#"{{"timestamp": "2026-02-19 08:00:00", "source": "league-stats", "teams": [{}]}}"#,
            rows.join(",")
        ),
    )
    .unwrap();

    // Injuries: one weighted-out star, one questionable role player
    std::fs::write(
        dir.join("injuries.csv"),
        "# timestamp: 2026-02-19 07:45:00\n\
         team,player,status,date\n\
         Boston Celtics,Jayson Tatum,Questionable - ankle,2026-02-19\n\
         Utah Jazz,Lauri Markkanen,Out - back,2026-02-18\n",
    )
    .unwrap();

    // Player impact: every canonical team id, a dozen players each
    let team_blobs: Vec<String> = teams::TEAMS
        .iter()
        .map(|t| {
            let players: Vec<String> = (0..12)
                .map(|i| format!(r#""{} Player {i}": {:.1}"#, t.nickname, (i as f64) - 4.0))
                .collect();
            format!(r#""{}": {{"players": {{{}}}}}"#, t.id, players.join(","))
        })
        .collect();
    std::fs::write(
        dir.join("player_impact.json"),
        format!(
            r#"{{"timestamp": "2026-02-19T06:00:00", "teams": {{{}}}}}"#,
            team_blobs.join(",")
        ),
    )
    .unwrap();

    // Rest penalties: all 30 teams, one on a back-to-back
    let mut rest = String::from("# timestamp: 2026-02-19 07:00:00\nteam,penalty\n");
    for name in teams::canonical_names() {
        let penalty = if name == "Utah Jazz" { -1.5 } else { 0.0 };
        rest.push_str(&format!("{name},{penalty}\n"));
    }
    std::fs::write(dir.join("rest_penalties.csv"), rest).unwrap();

    // Odds for tonight's game
    std::fs::write(
        dir.join("odds.json"),
        r#"{"games": {
            "Jazz @ Celtics": {
                "away": "Jazz", "home": "Celtics",
                "away_full": "Utah Jazz", "home_full": "Boston Celtics",
                "consensus_line": -9.5,
                "spreads": {"pinnacle": -9.5, "circa": -10.0, "dk": -9.0},
                "fetched_at": "2026-02-19T11:00:00"
            }
        }}"#,
    )
    .unwrap();

    // Schedule
    std::fs::write(
        dir.join("schedule.json"),
        r#"{"timestamp": "2026-02-19 05:00:00", "dates": {
            "2026-02-19": {
                "games": [{"away": "Utah Jazz", "home": "Boston Celtics", "time": "7:30 PM"}],
                "source": "league-site"
            }
        }}"#,
    )
    .unwrap();

    // News
    std::fs::write(
        dir.join("news.json"),
        r#"{"timestamp": "2026-02-19 09:00:00", "articles": [
            {"title": "League roundup", "summary": "Quiet slate ahead of the deadline."}
        ]}"#,
    )
    .unwrap();

    // Bankroll config
    std::fs::write(
        dir.join("bankroll.json"),
        r#"{"starting_bankroll": 1000, "unit_size": 10, "edge_cap": 10}"#,
    )
    .unwrap();
}

fn config_for(dir: &Path) -> AppConfig {
    let mut cfg = AppConfig::with_data_dir(dir);
    for kind in FeedKind::ALL {
        cfg.collectors
            .insert(kind.collector_key().to_string(), "true".to_string());
    }
    cfg
}

#[test]
fn healthy_feeds_pass_full_audit() {
    let dir = temp_data_dir();
    write_healthy_feeds(&dir);
    let cfg = config_for(&dir);

    let report = Auditor::new(&cfg, fixture_now().date(), fixture_now()).run(AuditMode::Full);
    assert_eq!(
        report.count(CheckStatus::Fail),
        0,
        "unexpected failures:\n{}",
        preflight::render(&report)
    );
    assert!(report.passed());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn passing_audit_stamps_ledger_and_new_wagers_inherit() {
    let dir = temp_data_dir();
    write_healthy_feeds(&dir);
    let cfg = config_for(&dir);
    let today = fixture_now().date();

    // A wager logged before the audit sits unstamped
    let early = WagerRecord {
        id: "1".to_string(),
        away: "Utah Jazz".to_string(),
        home: "Boston Celtics".to_string(),
        fair: "-11.2".to_string(),
        market: "-9.5".to_string(),
        edge: "1.7".to_string(),
        pick: "Boston Celtics".to_string(),
        result: "PENDING".to_string(),
        ..Default::default()
    };
    ledger::append_wager(&dir, today, early, None).unwrap();

    // Audit passes and stamps it
    let report = Auditor::new(&cfg, today, fixture_now()).run(AuditMode::Full);
    assert!(report.passed());
    let status = preflight::complete_audit(&report, &dir, today).unwrap();
    assert!(status.passed);

    let (_, rows) = ledger::read_table(&ledger::ledger_path(&dir, today)).unwrap();
    assert!(WagerRecord::from_row(&rows[0]).is_stamped());

    // A wager logged after the pass inherits the persisted status slot
    let slot = storage::load_status(&dir).unwrap().unwrap();
    let late = WagerRecord {
        id: "2".to_string(),
        away: "Utah Jazz".to_string(),
        home: "Boston Celtics".to_string(),
        fair: "-11.2".to_string(),
        market: "-9.5".to_string(),
        pick: "Utah Jazz".to_string(),
        result: "PENDING".to_string(),
        ..Default::default()
    };
    ledger::append_wager(&dir, today, late, Some(&slot)).unwrap();

    let (_, rows) = ledger::read_table(&ledger::ledger_path(&dir, today)).unwrap();
    let late = WagerRecord::from_row(&rows[1]);
    assert!(late.is_stamped());
    assert_eq!(late.audit_note, slot.summary);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_column_fails_its_check_but_other_sections_run() {
    let dir = temp_data_dir();
    write_healthy_feeds(&dir);
    // Strip the defensive rating column from every ratings row
    let ratings = std::fs::read_to_string(dir.join("team_ratings.json")).unwrap();
    let broken = regex_strip_def_rating(&ratings);
    std::fs::write(dir.join("team_ratings.json"), broken).unwrap();

    let cfg = config_for(&dir);
    let report = Auditor::new(&cfg, fixture_now().date(), fixture_now()).run(AuditMode::Full);

    // The columns check failed...
    let stats_section = report
        .sections
        .iter()
        .find(|s| s.name == preflight::SECTION_RATINGS)
        .unwrap();
    let columns = stats_section
        .checks
        .iter()
        .find(|c| c.id == "stats.columns")
        .unwrap();
    assert_eq!(columns.status, CheckStatus::Fail);
    assert!(columns.message.contains("def_rating"));

    // ...while every other section still executed and reported
    assert_eq!(report.sections.len(), 12);
    let odds_section = report
        .sections
        .iter()
        .find(|s| s.name == preflight::SECTION_ODDS)
        .unwrap();
    assert!(odds_section.count(CheckStatus::Pass) > 0);

    // Overall verdict: fail (exit status 1 at the CLI)
    assert!(!report.passed());
    std::fs::remove_dir_all(&dir).unwrap();
}

/// Remove the `"def_rating": <num>,` entries without pulling in a regex
/// dependency for one test.
fn regex_strip_def_rating(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut rest = json;
    while let Some(start) = rest.find("\"def_rating\": ") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail.find(", \"net_rating\"").expect("fixture shape");
        rest = &tail[end + 2..];
    }
    out.push_str(rest);
    out
}

#[test]
fn repeated_audits_are_idempotent() {
    let dir = temp_data_dir();
    write_healthy_feeds(&dir);
    let cfg = config_for(&dir);

    let first = Auditor::new(&cfg, fixture_now().date(), fixture_now()).run(AuditMode::Full);
    let second = Auditor::new(&cfg, fixture_now().date(), fixture_now()).run(AuditMode::Full);
    for status in [CheckStatus::Pass, CheckStatus::Warn, CheckStatus::Fail] {
        assert_eq!(first.count(status), second.count(status));
    }

    // The audit itself mutated no feeds
    let ratings_after = std::fs::read_to_string(dir.join("team_ratings.json")).unwrap();
    assert!(ratings_after.contains("league-stats"));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn backfill_then_audit_conformance() {
    let dir = temp_data_dir();
    write_healthy_feeds(&dir);
    let today = fixture_now().date();

    // A 14-column ledger from the earliest era
    std::fs::write(
        dir.join("wagers_2025-11-01.csv"),
        "ID,Away,Home,Fair,Market,Edge,Kelly,Pick,Book,Odds,Bet,Result,Payout,Notes\n\
         1,Utah Jazz,Boston Celtics,-7.5,-5.5,2.0,1.8%,Boston Celtics,circa,-110,25,WIN,22.73,\n",
    )
    .unwrap();

    let summary = ledger::backfill_ledgers(&dir, today).unwrap();
    assert_eq!(summary.files_updated, 1);

    // After backfill the historical ledger conforms (noted rows)
    let cfg = config_for(&dir);
    let report = Auditor::new(&cfg, today, fixture_now()).run(AuditMode::Full);
    let ledger_section = report
        .sections
        .iter()
        .find(|s| s.name == preflight::SECTION_LEDGER)
        .unwrap();
    let conformance = ledger_section
        .checks
        .iter()
        .find(|c| c.id == "ledger.conformance")
        .unwrap();
    assert_eq!(conformance.status, CheckStatus::Pass);

    // And a second backfill is a no-op
    let summary = ledger::backfill_ledgers(&dir, today).unwrap();
    assert_eq!(summary.files_updated, 0);
    std::fs::remove_dir_all(&dir).unwrap();
}
