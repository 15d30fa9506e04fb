//! Pre-bet validation audit.
//!
//! Audits every data feed, the cross-feed relationships, the model's own
//! output, and the wager ledgers, and aggregates everything into a single
//! pass/fail report. Execution is fail-soft: a broken feed fails its own
//! checks and the remaining sections still run, so every invocation yields
//! a complete report.
//!
//! Auditing is a pure read: with unchanged inputs two runs produce the same
//! report and mutate nothing. The stamping side effect on a passing run is
//! applied separately via [`complete_audit`].

pub mod feeds;
pub mod consistency;
pub mod model_check;
pub mod ledger_check;
pub mod pipeline;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt::Write as _;
use tracing::info;

use crate::config::AppConfig;
use crate::feeds::{FeedKind, FeedStore};
use crate::ledger;
use crate::storage;
use crate::types::{AuditReport, AuditState, AuditStatus, CheckStatus};

// ---------------------------------------------------------------------------
// Section names
// ---------------------------------------------------------------------------

pub const SECTION_RATINGS: &str = "1. TEAM RATINGS";
pub const SECTION_INJURIES: &str = "2. INJURIES";
pub const SECTION_IMPACT: &str = "3. PLAYER IMPACT";
pub const SECTION_REST: &str = "4. REST PENALTIES";
pub const SECTION_ODDS: &str = "5. ODDS / MARKET LINES";
pub const SECTION_SCHEDULE: &str = "6. SCHEDULE";
pub const SECTION_NEWS: &str = "7. NEWS";
pub const SECTION_BANKROLL: &str = "8. BANKROLL CONFIG";
pub const SECTION_CONSISTENCY: &str = "9. CROSS-FEED CONSISTENCY";
pub const SECTION_MODEL: &str = "10. MODEL SPOT-CHECK";
pub const SECTION_LEDGER: &str = "11. WAGER LEDGER INTEGRITY";
pub const SECTION_PIPELINE: &str = "12. PIPELINE FILES & COLLECTORS";

// ---------------------------------------------------------------------------
// Auditor
// ---------------------------------------------------------------------------

/// Which sections an invocation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditMode {
    /// All sections.
    Full,
    /// Feed freshness and structure only. Skips the consistency, model,
    /// and ledger sections.
    Quick,
}

pub struct Auditor<'a> {
    config: &'a AppConfig,
    today: NaiveDate,
    now: NaiveDateTime,
    state: AuditState,
}

impl<'a> Auditor<'a> {
    pub fn new(config: &'a AppConfig, today: NaiveDate, now: NaiveDateTime) -> Self {
        Self {
            config,
            today,
            now,
            state: AuditState::NotRun,
        }
    }

    pub fn state(&self) -> AuditState {
        self.state
    }

    /// Run the audit. Always returns a complete report; never mutates
    /// feeds or ledgers.
    pub fn run(&mut self, mode: AuditMode) -> AuditReport {
        self.state = AuditState::Running;
        let store = FeedStore::new(&self.config.data.dir, self.config.data.stale_hours);

        let mut report = AuditReport::new();
        // Pin the report to the auditor's clock so the status slot's date
        // always matches the operating day being audited.
        report.started_at = Utc.from_utc_datetime(&self.now);
        info!(run_id = %report.run_id, ?mode, "Audit starting");

        let (feed_sections, checked) = feeds::audit_feeds(&store, self.now);
        report.sections.extend(feed_sections);

        if mode == AuditMode::Full {
            report
                .sections
                .push(consistency::audit_consistency(&checked, self.today));
            report.sections.push(model_check::audit_model(
                &checked,
                self.today,
                self.config.audit.spot_check_games,
            ));
            report.sections.push(ledger_check::audit_ledgers(
                store.data_dir(),
                self.today,
            ));
        }

        report
            .sections
            .push(pipeline::audit_pipeline(self.config, store.data_dir()));

        let verdict = report.verdict();
        self.state = AuditState::Completed(verdict);
        info!(
            run_id = %report.run_id,
            pass = report.count(CheckStatus::Pass),
            warn = report.count(CheckStatus::Warn),
            fail = report.count(CheckStatus::Fail),
            %verdict,
            "Audit complete"
        );
        report
    }
}

/// Feeds whose section reported at least one FAIL: the re-fetch targets
/// for fix mode.
pub fn failing_feeds(report: &AuditReport) -> Vec<FeedKind> {
    let pairs: [(&str, FeedKind); 8] = [
        (SECTION_RATINGS, FeedKind::Ratings),
        (SECTION_INJURIES, FeedKind::Injuries),
        (SECTION_IMPACT, FeedKind::Impact),
        (SECTION_REST, FeedKind::Rest),
        (SECTION_ODDS, FeedKind::Odds),
        (SECTION_SCHEDULE, FeedKind::Schedule),
        (SECTION_NEWS, FeedKind::News),
        (SECTION_BANKROLL, FeedKind::Bankroll),
    ];
    pairs
        .iter()
        .filter(|(name, _)| {
            report
                .sections
                .iter()
                .any(|s| s.name == *name && s.has_failures())
        })
        .map(|(_, kind)| *kind)
        .collect()
}

/// Persist the status slot and, on a pass, stamp the current day's ledger.
/// Both effects are idempotent; this is the only mutation the audit path
/// ever performs.
pub fn complete_audit(
    report: &AuditReport,
    data_dir: &std::path::Path,
    today: NaiveDate,
) -> Result<AuditStatus> {
    let status = AuditStatus::from_report(report);
    storage::save_status(data_dir, &status)?;

    if status.passed {
        let path = ledger::ledger_path(data_dir, today);
        let stamped = ledger::stamp_ledger(&path, &status)?;
        if stamped > 0 {
            info!(stamped, "Stamped current ledger after passing audit");
        }
    }
    Ok(status)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the report as the operator-facing text block.
pub fn render(report: &AuditReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(72);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "  FAIRLINE PRE-BET AUDIT");
    let _ = writeln!(out, "  {}", report.started_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "{rule}");

    for section in &report.sections {
        let _ = writeln!(out, "\n─── {} {}", section.name, "─".repeat(60usize.saturating_sub(section.name.len())));
        for check in &section.checks {
            let _ = writeln!(out, "  {check}");
            for detail in &check.details {
                let _ = writeln!(out, "       ↳ {detail}");
            }
        }
    }

    let pass = report.count(CheckStatus::Pass);
    let warn = report.count(CheckStatus::Warn);
    let fail = report.count(CheckStatus::Fail);
    let _ = writeln!(out, "\n{rule}");
    let _ = writeln!(
        out,
        "  RESULTS: {pass} PASS | {warn} WARN | {fail} FAIL  ({} checks)",
        report.total_checks()
    );
    let _ = writeln!(out, "  {}", report.verdict());
    let _ = writeln!(out, "{rule}");

    let failures = report.remediations(CheckStatus::Fail);
    if !failures.is_empty() {
        let _ = writeln!(out, "\n  🔧 HOW TO FIX");
        for (i, check) in failures.iter().enumerate() {
            let _ = writeln!(out, "  {}. ❌ {}", i + 1, check.id);
            let _ = writeln!(out, "     Problem: {}", check.message);
            if let Some(fix) = &check.fix_hint {
                let _ = writeln!(out, "     Fix:     {fix}");
            }
        }
    }

    let warnings = report.remediations(CheckStatus::Warn);
    if failures.is_empty() && !warnings.is_empty() {
        let _ = writeln!(out, "\n  📋 WARNINGS TO REVIEW");
        for (i, check) in warnings.iter().enumerate() {
            let _ = writeln!(out, "  {}. ⚠️  {}", i + 1, check.id);
            let _ = writeln!(out, "     {}", check.message);
            if let Some(fix) = &check.fix_hint {
                let _ = writeln!(out, "     Suggestion: {fix}");
            }
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
