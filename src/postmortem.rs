//! Historical wager audit.
//!
//! The feed caches are overwritten on every refresh, so a past prediction
//! can never be re-run against its original inputs. What can be done is
//! algebra: the recorded Fair/Market/Edge/Kelly/CLV values were all produced
//! by known formulas, so each ledger row is checked for internal
//! self-consistency and disagreements are surfaced, never auto-corrected.

use anyhow::Result;
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::ledger::{self, find_ledgers, read_table, WagerRecord};
use crate::strategy::edge::recommended_side;
use crate::strategy::kelly::KellyCalculator;
use crate::teams;

/// Tolerance for recomputed edges (rounding drift in recorded values).
const EDGE_TOLERANCE: f64 = 0.05;
/// Tolerance for recomputed Kelly percentages.
const KELLY_TOLERANCE: f64 = 0.1;

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Recomputation disagrees with the recorded value beyond tolerance.
    Error,
    /// Data-quality concern (missing stamp, unparseable field).
    Warn,
    /// Explained by a recorded override or historical note.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warn => write!(f, "WARN"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Finding {
    pub file: String,
    pub wager_id: String,
    pub severity: Severity,
    pub message: String,
}

/// Per-ledger outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerVerdict {
    Clean,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LedgerSummary {
    pub file: String,
    pub wagers: usize,
    pub clean: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl LedgerSummary {
    pub fn verdict(&self) -> LedgerVerdict {
        if self.errors > 0 {
            LedgerVerdict::Error
        } else if self.warnings > 0 {
            LedgerVerdict::Warn
        } else {
            LedgerVerdict::Clean
        }
    }
}

/// Win/loss tally for the stamped-vs-unstamped comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
}

impl Tally {
    pub fn decided(&self) -> usize {
        self.wins + self.losses
    }

    pub fn win_rate(&self) -> Option<f64> {
        match self.decided() {
            0 => None,
            n => Some(self.wins as f64 / n as f64 * 100.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostmortemReport {
    pub summaries: Vec<LedgerSummary>,
    pub findings: Vec<Finding>,
    pub verified: Tally,
    pub unverified: Tally,
}

impl PostmortemReport {
    pub fn total_wagers(&self) -> usize {
        self.summaries.iter().map(|s| s.wagers).sum()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn verdict(&self) -> LedgerVerdict {
        if self.count(Severity::Error) > 0 {
            LedgerVerdict::Error
        } else if self.count(Severity::Warn) > 0 {
            LedgerVerdict::Warn
        } else {
            LedgerVerdict::Clean
        }
    }
}

// ---------------------------------------------------------------------------
// Auditor
// ---------------------------------------------------------------------------

pub struct HistoricalAuditor {
    edge_cap: f64,
    kelly: KellyCalculator,
}

impl HistoricalAuditor {
    pub fn new(edge_cap: f64) -> Self {
        Self {
            edge_cap,
            kelly: KellyCalculator::default(),
        }
    }

    /// Audit every ledger in the data directory.
    pub fn audit_all(&self, data_dir: &Path) -> Result<PostmortemReport> {
        let mut report = PostmortemReport {
            summaries: Vec::new(),
            findings: Vec::new(),
            verified: Tally::default(),
            unverified: Tally::default(),
        };

        for path in find_ledgers(data_dir) {
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let (header, rows) = match read_table(&path) {
                Ok(table) => table,
                Err(_) => {
                    report.summaries.push(LedgerSummary {
                        file,
                        wagers: 0,
                        clean: 0,
                        warnings: 0,
                        errors: 0,
                    });
                    continue;
                }
            };
            // Validate against the canonical layout regardless of the
            // file's era; unknown schemas fail loudly here too.
            let (_, rows) = ledger::schema::migrate_table(&path, &header, &rows)?;

            let mut summary = LedgerSummary {
                file: file.clone(),
                wagers: rows.len(),
                clean: 0,
                warnings: 0,
                errors: 0,
            };

            for row in &rows {
                let rec = WagerRecord::from_row(row);
                let row_findings = self.audit_row(&rec);

                let has_error = row_findings.iter().any(|(s, _)| *s == Severity::Error);
                let has_warn = row_findings.iter().any(|(s, _)| *s == Severity::Warn);
                if has_error {
                    summary.errors += 1;
                } else if has_warn {
                    summary.warnings += 1;
                } else {
                    summary.clean += 1;
                }

                for (severity, message) in row_findings {
                    report.findings.push(Finding {
                        file: file.clone(),
                        wager_id: if rec.id.is_empty() { "?".into() } else { rec.id.clone() },
                        severity,
                        message,
                    });
                }

                // Stamped-vs-unstamped performance tally
                let tally = if rec.is_stamped() {
                    &mut report.verified
                } else {
                    &mut report.unverified
                };
                match rec.result.trim() {
                    "WIN" => tally.wins += 1,
                    "LOSS" => tally.losses += 1,
                    "PUSH" => tally.pushes += 1,
                    _ => {}
                }
            }

            report.summaries.push(summary);
        }

        info!(
            ledgers = report.summaries.len(),
            wagers = report.total_wagers(),
            errors = report.count(Severity::Error),
            warnings = report.count(Severity::Warn),
            "Historical audit complete"
        );
        Ok(report)
    }

    /// Check one record's recorded values against the known formulas.
    fn audit_row(&self, rec: &WagerRecord) -> Vec<(Severity, String)> {
        let mut findings: Vec<(Severity, String)> = Vec::new();

        let fair = rec.fair_value();
        if fair.is_none() && !rec.fair.trim().is_empty() {
            findings.push((Severity::Error, format!("Fair={:?} non-numeric", rec.fair)));
        }
        let market = rec.market_value();
        if market.is_none() && !rec.market.trim().is_empty() {
            findings.push((Severity::Error, format!("Market={:?} non-numeric", rec.market)));
        }

        if let (Some(fair), Some(market)) = (fair, market) {
            let expected_raw = round2((fair - market).abs());

            if let Some(raw_recorded) = rec.raw_edge_value() {
                if (raw_recorded - expected_raw).abs() > EDGE_TOLERANCE {
                    findings.push((
                        Severity::Error,
                        format!("Raw_Edge={raw_recorded} ≠ |Fair−Market|={expected_raw}"),
                    ));
                }
            }

            let expected_edge = expected_raw.min(self.edge_cap);
            let edge_recorded = rec.edge_value();
            if let Some(edge) = edge_recorded {
                // Tolerate a different cap at the time the bet was logged:
                // the recorded edge must match either today's capped value
                // or the uncapped raw edge.
                if (edge - expected_edge).abs() > EDGE_TOLERANCE
                    && (edge - expected_raw).abs() > EDGE_TOLERANCE
                {
                    findings.push((
                        Severity::Error,
                        format!(
                            "Edge={edge} ≠ expected {expected_edge} (|Fair−Market|={expected_raw})"
                        ),
                    ));
                }
            }

            // Kelly re-derivation from the recorded edge
            if !rec.kelly.trim().is_empty() {
                match rec.kelly_percent() {
                    Some(kelly_recorded) => {
                        let effective_edge = edge_recorded.unwrap_or(expected_edge);
                        let expected_kelly = self.kelly.stake_percent(effective_edge);
                        if (kelly_recorded - expected_kelly).abs() > KELLY_TOLERANCE {
                            findings.push((
                                Severity::Warn,
                                format!(
                                    "Kelly={kelly_recorded}% ≠ expected {expected_kelly}% (drift={:+.2})",
                                    kelly_recorded - expected_kelly
                                ),
                            ));
                        }
                    }
                    None => {
                        findings.push((
                            Severity::Warn,
                            format!("Kelly={:?} unparseable", rec.kelly),
                        ));
                    }
                }
            }

            // Pick direction
            if !rec.pick.is_empty() {
                let matches_side = |team: &str| match (teams::resolve(&rec.pick), teams::resolve(team)) {
                    (Some(p), Some(t)) => p.id == t.id,
                    _ => rec.pick == team,
                };
                if !matches_side(&rec.away) && !matches_side(&rec.home) {
                    findings.push((
                        Severity::Error,
                        format!(
                            "Pick={:?} not in {{Away={:?}, Home={:?}}}",
                            rec.pick, rec.away, rec.home
                        ),
                    ));
                } else {
                    let expected = match recommended_side(fair, market) {
                        crate::strategy::edge::Side::Home => &rec.home,
                        crate::strategy::edge::Side::Away => &rec.away,
                    };
                    if !matches_side(expected) {
                        findings.push((
                            Severity::Info,
                            format!(
                                "Pick={} differs from model rec={expected} (user override)",
                                rec.pick
                            ),
                        ));
                    }
                }
            }

            // Edge-capped flag consistency
            let capped_flag = rec.edge_capped.trim().to_uppercase();
            if capped_flag == "YES" && expected_raw <= self.edge_cap {
                findings.push((
                    Severity::Warn,
                    format!("Edge_Capped=YES but raw edge {expected_raw} ≤ cap {}", self.edge_cap),
                ));
            } else if capped_flag == "NO" && expected_raw > self.edge_cap {
                findings.push((
                    Severity::Warn,
                    format!("Edge_Capped=NO but raw edge {expected_raw} > cap {}", self.edge_cap),
                ));
            }

            // CLV re-derivation from the recorded closing line
            if let (Some(closing), Some(clv)) = (rec.closing_line_value(), rec.clv_value()) {
                if let Some(expected_clv) =
                    ledger::clv_for_pick(&rec.pick, &rec.away, &rec.home, market, closing)
                {
                    if (clv - expected_clv).abs() > EDGE_TOLERANCE {
                        findings.push((
                            Severity::Error,
                            format!("CLV={clv} ≠ expected {expected_clv} (closing={closing})"),
                        ));
                    }
                }
            }
        }

        // Stamp coverage
        if !rec.is_handled() {
            findings.push((Severity::Warn, "No audit stamp or note".to_string()));
        } else if !rec.is_stamped() && rec.audit_note.contains("Historical") {
            findings.push((
                Severity::Info,
                "Historical - cannot retroactively validate".to_string(),
            ));
        }

        findings
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Operator-facing text block for the historical audit.
pub fn render(report: &PostmortemReport) -> String {
    use std::fmt::Write as _;
    let mut out = String::new();
    let rule = "=".repeat(72);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "  WAGER VALIDATION AUDIT - internal consistency");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "  {} ledger(s), {} total wagers",
        report.summaries.len(),
        report.total_wagers()
    );
    let _ = writeln!(out, "  {:<28} {:>5} {:>6} {:>5} {:>6}", "Ledger", "Bets", "Clean", "Warn", "Error");
    for s in &report.summaries {
        let icon = match s.verdict() {
            LedgerVerdict::Error => "❌",
            LedgerVerdict::Warn => "⚠️ ",
            LedgerVerdict::Clean => "✅",
        };
        let _ = writeln!(
            out,
            "  {icon} {:<25} {:>5} {:>6} {:>5} {:>6}",
            s.file, s.wagers, s.clean, s.warnings, s.errors
        );
    }

    for severity in [Severity::Error, Severity::Warn, Severity::Info] {
        let matching: Vec<&Finding> = report
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect();
        if matching.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n  {severity} ({}):", matching.len());
        for f in matching.iter().take(15) {
            let _ = writeln!(out, "     {}/{}: {}", f.file, f.wager_id, f.message);
        }
        if matching.len() > 15 {
            let _ = writeln!(out, "     ... and {} more", matching.len() - 15);
        }
    }

    let _ = writeln!(out, "\n  STAMPED vs UNSTAMPED PERFORMANCE:");
    match report.verified.win_rate() {
        Some(rate) => {
            let _ = writeln!(
                out,
                "     ✅ Verified wagers:   {}W-{}L ({rate:.1}% win rate)",
                report.verified.wins, report.verified.losses
            );
        }
        None => {
            let _ = writeln!(out, "     ✅ Verified wagers:   no decided wagers yet");
        }
    }
    match report.unverified.win_rate() {
        Some(rate) => {
            let _ = writeln!(
                out,
                "     ⚠️  Unverified wagers: {}W-{}L ({rate:.1}% win rate)",
                report.unverified.wins, report.unverified.losses
            );
        }
        None => {
            let _ = writeln!(out, "     ⚠️  Unverified wagers: no decided wagers yet");
        }
    }

    let _ = writeln!(out, "\n{rule}");
    let _ = match report.verdict() {
        LedgerVerdict::Error => writeln!(
            out,
            "  🔴 AUDIT RESULT: {} wager(s) have math inconsistencies in recorded data.",
            report.count(Severity::Error)
        ),
        LedgerVerdict::Warn => writeln!(
            out,
            "  🟡 AUDIT RESULT: all math checks pass. {} warning(s) to review.",
            report.count(Severity::Warn)
        ),
        LedgerVerdict::Clean => writeln!(
            out,
            "  🟢 AUDIT RESULT: all {} wager(s) internally consistent.",
            report.total_wagers()
        ),
    };
    let _ = writeln!(out, "{rule}");

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
