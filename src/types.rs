//! Shared types for the FAIRLINE tool.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that feed, engine, audit,
//! and ledger modules can depend on them without circular references.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Check results
// ---------------------------------------------------------------------------

/// Outcome of a single validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "✅"),
            CheckStatus::Warn => write!(f, "⚠️ "),
            CheckStatus::Fail => write!(f, "❌"),
        }
    }
}

/// One check row in an audit report: identifier, outcome, human message,
/// optional supporting detail lines, and a remediation hint shown in the
/// summary when the outcome is WARN or FAIL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub id: String,
    pub status: CheckStatus,
    pub message: String,
    pub details: Vec<String>,
    pub fix_hint: Option<String>,
}

impl CheckResult {
    pub fn pass(id: &str, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            status: CheckStatus::Pass,
            message: message.into(),
            details: Vec::new(),
            fix_hint: None,
        }
    }

    pub fn warn(id: &str, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            status: CheckStatus::Warn,
            message: message.into(),
            details: Vec::new(),
            fix_hint: None,
        }
    }

    pub fn fail(id: &str, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            status: CheckStatus::Fail,
            message: message.into(),
            details: Vec::new(),
            fix_hint: None,
        }
    }

    /// Attach supporting detail lines (shown indented under the check).
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Attach a remediation hint.
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix_hint = Some(fix.into());
        self
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:.<40}] {}", self.status, self.id, self.message)
    }
}

/// All check rows produced by one independently-addressable audit section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionReport {
    pub name: String,
    pub checks: Vec<CheckResult>,
}

impl SectionReport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checks: Vec::new(),
        }
    }

    pub fn push(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(CheckStatus::Fail) > 0
    }
}

// ---------------------------------------------------------------------------
// Audit report & verdict
// ---------------------------------------------------------------------------

/// Terminal verdict of an audit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditVerdict {
    Pass,
    PassWithWarnings,
    Fail,
}

impl fmt::Display for AuditVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditVerdict::Pass => write!(f, "🟢 ALL CLEAR"),
            AuditVerdict::PassWithWarnings => write!(f, "🟡 WARNINGS ONLY"),
            AuditVerdict::Fail => write!(f, "🔴 FAILURES DETECTED"),
        }
    }
}

/// Audit run lifecycle. A run moves NotRun → Running → Completed and the
/// completed verdict is terminal for that run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditState {
    NotRun,
    Running,
    Completed(AuditVerdict),
}

/// Aggregated result of one audit invocation. Every invocation produces a
/// complete report: a failing section never prevents later sections from
/// contributing their rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub sections: Vec<SectionReport>,
}

impl AuditReport {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            sections: Vec::new(),
        }
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.sections.iter().map(|s| s.count(status)).sum()
    }

    pub fn total_checks(&self) -> usize {
        self.sections.iter().map(|s| s.checks.len()).sum()
    }

    /// Verdict rule: any FAIL fails the run; WARNs never block.
    pub fn verdict(&self) -> AuditVerdict {
        if self.count(CheckStatus::Fail) > 0 {
            AuditVerdict::Fail
        } else if self.count(CheckStatus::Warn) > 0 {
            AuditVerdict::PassWithWarnings
        } else {
            AuditVerdict::Pass
        }
    }

    pub fn passed(&self) -> bool {
        self.count(CheckStatus::Fail) == 0
    }

    /// All WARN/FAIL rows that carry a remediation hint, for the summary.
    pub fn remediations(&self, status: CheckStatus) -> Vec<&CheckResult> {
        self.sections
            .iter()
            .flat_map(|s| s.checks.iter())
            .filter(|c| c.status == status && c.fix_hint.is_some())
            .collect()
    }
}

impl Default for AuditReport {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Audit status slot
// ---------------------------------------------------------------------------

/// Most-recent-audit record. This is the single piece of state that must
/// survive a process restart: newly logged wagers inherit the current slot
/// at creation time, and the stamper consumes it after a passing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStatus {
    pub passed: bool,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub checks: usize,
    pub warnings: usize,
    pub failures: usize,
    pub summary: String,
}

impl AuditStatus {
    pub fn from_report(report: &AuditReport) -> Self {
        let checks = report.count(CheckStatus::Pass);
        let warnings = report.count(CheckStatus::Warn);
        let failures = report.count(CheckStatus::Fail);
        let passed = failures == 0;
        let summary = if passed {
            format!("PASS ({checks}✓ {warnings}⚠)")
        } else {
            format!("FAIL ({failures}✗ {warnings}⚠)")
        };
        Self {
            passed,
            date: report.started_at.date_naive(),
            timestamp: report.started_at,
            checks,
            warnings,
            failures,
            summary,
        }
    }

    /// A status is only trusted for stamping on the calendar day it was
    /// produced; anything older is discardable.
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.date == today
    }

    /// Stamp value written into ledger rows.
    pub fn stamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({} checks, {} warn, {} fail)",
            self.summary,
            self.stamp(),
            self.checks,
            self.warnings,
            self.failures,
        )
    }
}

// ---------------------------------------------------------------------------
// Model output enums
// ---------------------------------------------------------------------------

/// How much of the fair line was backed by real, fresh data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "HIGH"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::Low => write!(f, "LOW"),
        }
    }
}

/// Quantized play strength from (edge, confidence). Capped edges are
/// review-required and never actionable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalTier {
    NoPlay,
    Lean,
    Play,
    Strong,
    ReviewRequired,
}

impl fmt::Display for SignalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalTier::NoPlay => write!(f, "NO PLAY"),
            SignalTier::Lean => write!(f, "LEAN"),
            SignalTier::Play => write!(f, "PLAY"),
            SignalTier::Strong => write!(f, "STRONG"),
            SignalTier::ReviewRequired => write!(f, "REVIEW REQUIRED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for FAIRLINE.
///
/// Feed problems are detected and classified by the auditor; the prediction
/// path degrades instead of raising them. The only conditions that demand
/// operator intervention are an unrecognized ledger schema and a config
/// problem.
#[derive(Debug, thiserror::Error)]
pub enum FairlineError {
    #[error("Collector unavailable ({feed}): {message}")]
    CollectorUnavailable { feed: String, message: String },

    #[error("Feed missing: {0}")]
    FeedMissing(String),

    #[error("Feed stale ({feed}): {age_hours:.1}h old")]
    FeedStale { feed: String, age_hours: f64 },

    #[error("Feed malformed ({feed}): {message}")]
    FeedMalformed { feed: String, message: String },

    #[error("Unrecognized ledger schema in {path}: {columns} columns match no known version")]
    SchemaVersionUnrecognized { path: String, columns: usize },

    #[error("Cross-feed consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("Formula mismatch: {0}")]
    FormulaMismatch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
