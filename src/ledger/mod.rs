//! Wager ledger — append-only bet records with audit stamping.
//!
//! One CSV per operating day (`wagers_<date>.csv`). Rows are only ever
//! appended or extended with new columns; positional rewrites happen solely
//! through the explicit schema migration in [`schema`]. All writes go
//! through a write-temp-then-rename so a concurrent reader never sees a
//! half-written ledger.

pub mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::strategy::edge::Side;
use crate::teams;
use crate::types::AuditStatus;
use schema::{column_index, is_canonical, migrate_table, CANONICAL_COLUMNS};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One wager row in canonical form. Everything is kept as the string that
/// was (or will be) written; typed accessors parse on demand because
/// historical rows contain blanks and free text.
#[derive(Debug, Clone, Default)]
pub struct WagerRecord {
    pub id: String,
    pub timestamp: String,
    pub away: String,
    pub home: String,
    pub fair: String,
    pub market: String,
    pub edge: String,
    pub raw_edge: String,
    pub edge_capped: String,
    pub kelly: String,
    pub confidence: String,
    pub pick: String,
    pub bet_type: String,
    pub book: String,
    pub odds: String,
    pub bet: String,
    pub to_win: String,
    pub result: String,
    pub payout: String,
    pub notes: String,
    pub closing_line: String,
    pub clv: String,
    pub audit_stamp: String,
    pub audit_note: String,
}

impl WagerRecord {
    pub fn from_row(row: &[String]) -> Self {
        let get = |name: &str| {
            column_index(name)
                .and_then(|i| row.get(i))
                .cloned()
                .unwrap_or_default()
        };
        Self {
            id: get("ID"),
            timestamp: get("Timestamp"),
            away: get("Away"),
            home: get("Home"),
            fair: get("Fair"),
            market: get("Market"),
            edge: get("Edge"),
            raw_edge: get("Raw_Edge"),
            edge_capped: get("Edge_Capped"),
            kelly: get("Kelly"),
            confidence: get("Confidence"),
            pick: get("Pick"),
            bet_type: get("Type"),
            book: get("Book"),
            odds: get("Odds"),
            bet: get("Bet"),
            to_win: get("ToWin"),
            result: get("Result"),
            payout: get("Payout"),
            notes: get("Notes"),
            closing_line: get("ClosingLine"),
            clv: get("CLV"),
            audit_stamp: get("AuditStamp"),
            audit_note: get("AuditNote"),
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.timestamp.clone(),
            self.away.clone(),
            self.home.clone(),
            self.fair.clone(),
            self.market.clone(),
            self.edge.clone(),
            self.raw_edge.clone(),
            self.edge_capped.clone(),
            self.kelly.clone(),
            self.confidence.clone(),
            self.pick.clone(),
            self.bet_type.clone(),
            self.book.clone(),
            self.odds.clone(),
            self.bet.clone(),
            self.to_win.clone(),
            self.result.clone(),
            self.payout.clone(),
            self.notes.clone(),
            self.closing_line.clone(),
            self.clv.clone(),
            self.audit_stamp.clone(),
            self.audit_note.clone(),
        ]
    }

    pub fn fair_value(&self) -> Option<f64> {
        self.fair.trim().parse().ok()
    }

    pub fn market_value(&self) -> Option<f64> {
        self.market.trim().parse().ok()
    }

    pub fn edge_value(&self) -> Option<f64> {
        self.edge.trim().parse().ok()
    }

    pub fn raw_edge_value(&self) -> Option<f64> {
        self.raw_edge.trim().parse().ok()
    }

    pub fn kelly_percent(&self) -> Option<f64> {
        self.kelly.trim().trim_end_matches('%').parse().ok()
    }

    pub fn closing_line_value(&self) -> Option<f64> {
        self.closing_line.trim().parse().ok()
    }

    pub fn clv_value(&self) -> Option<f64> {
        self.clv.trim().parse().ok()
    }

    pub fn is_stamped(&self) -> bool {
        !self.audit_stamp.trim().is_empty()
    }

    /// Stamped, or carrying a note explaining why it never can be.
    pub fn is_handled(&self) -> bool {
        self.is_stamped() || !self.audit_note.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

pub fn ledger_file_name(date: NaiveDate) -> String {
    format!("wagers_{}.csv", date.format("%Y-%m-%d"))
}

pub fn ledger_path(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir.join(ledger_file_name(date))
}

/// Operating date encoded in a ledger file name.
pub fn ledger_date(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let date_part = name.strip_prefix("wagers_")?.strip_suffix(".csv")?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// All ledger files in the data directory, sorted by name (= by date).
pub fn find_ledgers(data_dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(data_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| ledger_date(p).is_some())
                .collect()
        })
        .unwrap_or_default();
    paths.sort();
    paths
}

/// Raw table read: header row plus data rows, cells as strings.
pub fn read_table(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to open ledger {}", path.display()))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Failed to read {}", path.display()))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    if rows.is_empty() {
        anyhow::bail!("Ledger {} is empty", path.display());
    }
    let header = rows.remove(0);
    Ok((header, rows))
}

/// Atomic rewrite: serialize to a temp file in the same directory, then
/// rename over the target, so readers never observe a partial ledger.
pub fn write_table_atomic(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", tmp.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Appending & stamping
// ---------------------------------------------------------------------------

/// Append a wager to the ledger for its operating date, creating the file
/// with the canonical header if needed. When a current-day passing audit
/// status is supplied, the new row inherits its stamp at creation time.
pub fn append_wager(
    data_dir: &Path,
    date: NaiveDate,
    mut record: WagerRecord,
    status: Option<&AuditStatus>,
) -> Result<()> {
    if let Some(status) = status {
        if status.passed && status.is_current(date) && !record.is_handled() {
            record.audit_stamp = status.stamp();
            record.audit_note = status.summary.clone();
        }
    }

    let path = ledger_path(data_dir, date);
    let (header, mut rows) = if path.exists() {
        let (header, rows) = read_table(&path)?;
        let (header, rows) = migrate_table(&path, &header, &rows)?;
        (header, rows)
    } else {
        (
            CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            Vec::new(),
        )
    };

    rows.push(record.to_row());
    write_table_atomic(&path, &header, &rows)?;
    debug!(path = %path.display(), rows = rows.len(), "Wager appended");
    Ok(())
}

/// Stamp every unhandled row in a ledger with the audit outcome.
/// First-stamp-wins: rows already stamped or noted are never touched, so
/// re-running a passing audit never rewrites history.
pub fn stamp_ledger(path: &Path, status: &AuditStatus) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let (header, rows) = read_table(path)?;
    let (header, mut rows) = migrate_table(path, &header, &rows)?;

    let stamp_idx = column_index("AuditStamp").expect("canonical column");
    let note_idx = column_index("AuditNote").expect("canonical column");

    let mut stamped = 0;
    for row in &mut rows {
        if row[stamp_idx].trim().is_empty() && row[note_idx].trim().is_empty() {
            row[stamp_idx] = status.stamp();
            row[note_idx] = status.summary.clone();
            stamped += 1;
        }
    }

    if stamped > 0 {
        write_table_atomic(path, &header, &rows)?;
        info!(path = %path.display(), stamped, "Ledger stamped");
    }
    Ok(stamped)
}

// ---------------------------------------------------------------------------
// Backfill
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    pub files_updated: usize,
    pub files_skipped: usize,
    pub rows_noted: usize,
}

/// Migrate every historical ledger to the canonical schema and note rows
/// that were never audited. The original feed snapshots are overwritten
/// daily, so past rows cannot be validated retroactively; their note says
/// exactly that. The current day's rows instead get an actionable note.
/// Idempotent: a second run rewrites nothing.
pub fn backfill_ledgers(data_dir: &Path, today: NaiveDate) -> Result<BackfillSummary> {
    let mut summary = BackfillSummary::default();

    for path in find_ledgers(data_dir) {
        let (header, rows) = match read_table(&path) {
            Ok(table) => table,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable ledger");
                summary.files_skipped += 1;
                continue;
            }
        };
        let already_canonical = is_canonical(&header);
        let (new_header, mut new_rows) = migrate_table(&path, &header, &rows)?;

        let stamp_idx = column_index("AuditStamp").expect("canonical column");
        let note_idx = column_index("AuditNote").expect("canonical column");

        let all_handled = new_rows.iter().all(|r| {
            !r[stamp_idx].trim().is_empty() || !r[note_idx].trim().is_empty()
        });
        if already_canonical && all_handled {
            debug!(path = %path.display(), "Already migrated and handled, skipping");
            summary.files_skipped += 1;
            continue;
        }

        let date = ledger_date(&path);
        let note = match date {
            Some(d) if d == today => "Added by backfill - run the audit to validate".to_string(),
            Some(d) => format!(
                "Historical - feed snapshots from {d} no longer available for retroactive validation"
            ),
            None => "Historical - original feed snapshots not retained".to_string(),
        };

        let mut noted = 0;
        for row in &mut new_rows {
            if row[stamp_idx].trim().is_empty() && row[note_idx].trim().is_empty() {
                row[note_idx] = note.clone();
                noted += 1;
            }
        }

        write_table_atomic(&path, &new_header, &new_rows)?;
        info!(path = %path.display(), noted, "Ledger backfilled");
        summary.files_updated += 1;
        summary.rows_noted += noted;
    }

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Closing line value
// ---------------------------------------------------------------------------

/// CLV from the bettor's perspective: positive always means the bet beat
/// the closing number.
///
/// Both lines are in home orientation. A home bettor gains when the close
/// moves further negative (they gave fewer points than the market settled
/// on); an away bettor gains when it moves the other way.
pub fn clv_for_side(side: Side, market: f64, closing: f64) -> f64 {
    let raw = match side {
        Side::Home => market - closing,
        Side::Away => closing - market,
    };
    (raw * 100.0).round() / 100.0
}

/// CLV for a recorded pick, resolving the pick against the matchup's teams.
/// Returns None when the pick matches neither side.
pub fn clv_for_pick(pick: &str, away: &str, home: &str, market: f64, closing: f64) -> Option<f64> {
    let pick = teams::resolve(pick)?;
    let side = if teams::resolve(home).map(|t| t.id) == Some(pick.id) {
        Side::Home
    } else if teams::resolve(away).map(|t| t.id) == Some(pick.id) {
        Side::Away
    } else {
        return None;
    };
    Some(clv_for_side(side, market, closing))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuditReport, CheckResult, SectionReport};

    fn temp_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("fairline_ledger_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&p).unwrap();
        p
    }

    fn passing_status(date: NaiveDate) -> AuditStatus {
        let mut report = AuditReport::new();
        let mut section = SectionReport::new("feeds");
        section.push(CheckResult::pass("feeds.ok", "fine"));
        report.sections.push(section);
        let mut status = AuditStatus::from_report(&report);
        status.date = date;
        status
    }

    fn sample_record(id: &str) -> WagerRecord {
        WagerRecord {
            id: id.to_string(),
            timestamp: "2026-02-19 18:30:00".to_string(),
            away: "Utah Jazz".to_string(),
            home: "Boston Celtics".to_string(),
            fair: "-11.2".to_string(),
            market: "-9.5".to_string(),
            edge: "1.7".to_string(),
            raw_edge: "1.7".to_string(),
            edge_capped: "NO".to_string(),
            kelly: "1.36%".to_string(),
            confidence: "HIGH".to_string(),
            pick: "Boston Celtics".to_string(),
            bet_type: "Spread".to_string(),
            book: "circa".to_string(),
            odds: "-110".to_string(),
            bet: "25".to_string(),
            result: "PENDING".to_string(),
            ..Default::default()
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // -- CLV sign contract --

    #[test]
    fn test_clv_home_pick_favorable() {
        // Home pick at −5.5, market closed −7.0: bettor gave 1.5 fewer
        // points than the close. Favorable: +1.5, never −1.5.
        assert_eq!(clv_for_side(Side::Home, -5.5, -7.0), 1.5);
    }

    #[test]
    fn test_clv_home_pick_unfavorable() {
        assert_eq!(clv_for_side(Side::Home, -7.0, -5.5), -1.5);
    }

    #[test]
    fn test_clv_away_pick_mirrors() {
        assert_eq!(clv_for_side(Side::Away, -5.5, -7.0), -1.5);
        assert_eq!(clv_for_side(Side::Away, 3.0, 4.5), 1.5);
    }

    #[test]
    fn test_clv_for_pick_resolves_teams() {
        let clv = clv_for_pick("Boston Celtics", "Utah Jazz", "Boston Celtics", -5.5, -7.0);
        assert_eq!(clv, Some(1.5));
        let clv = clv_for_pick("Jazz", "Utah Jazz", "Boston Celtics", -5.5, -7.0);
        assert_eq!(clv, Some(-1.5));
        assert_eq!(
            clv_for_pick("Miami Heat", "Utah Jazz", "Boston Celtics", -5.5, -7.0),
            None
        );
    }

    // -- append & inherit --

    #[test]
    fn test_append_creates_canonical_ledger() {
        let dir = temp_dir();
        let d = day("2026-02-19");
        append_wager(&dir, d, sample_record("1"), None).unwrap();

        let (header, rows) = read_table(&ledger_path(&dir, d)).unwrap();
        assert_eq!(header.len(), 24);
        assert_eq!(rows.len(), 1);
        let rec = WagerRecord::from_row(&rows[0]);
        assert_eq!(rec.pick, "Boston Celtics");
        assert!(!rec.is_handled());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_append_inherits_current_passing_status() {
        let dir = temp_dir();
        let d = day("2026-02-19");
        let status = passing_status(d);
        append_wager(&dir, d, sample_record("1"), Some(&status)).unwrap();

        let (_, rows) = read_table(&ledger_path(&dir, d)).unwrap();
        let rec = WagerRecord::from_row(&rows[0]);
        assert!(rec.is_stamped());
        assert_eq!(rec.audit_note, status.summary);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_append_ignores_stale_status() {
        let dir = temp_dir();
        let status = passing_status(day("2026-02-18"));
        append_wager(&dir, day("2026-02-19"), sample_record("1"), Some(&status)).unwrap();

        let (_, rows) = read_table(&ledger_path(&dir, day("2026-02-19"))).unwrap();
        assert!(!WagerRecord::from_row(&rows[0]).is_stamped());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_append_ignores_failing_status() {
        let dir = temp_dir();
        let d = day("2026-02-19");
        let mut status = passing_status(d);
        status.passed = false;
        append_wager(&dir, d, sample_record("1"), Some(&status)).unwrap();

        let (_, rows) = read_table(&ledger_path(&dir, d)).unwrap();
        assert!(!WagerRecord::from_row(&rows[0]).is_stamped());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    // -- stamping --

    #[test]
    fn test_stamp_then_restamp_is_noop() {
        let dir = temp_dir();
        let d = day("2026-02-19");
        append_wager(&dir, d, sample_record("1"), None).unwrap();
        append_wager(&dir, d, sample_record("2"), None).unwrap();

        let path = ledger_path(&dir, d);
        let status = passing_status(d);
        assert_eq!(stamp_ledger(&path, &status).unwrap(), 2);

        // A later run must not re-stamp
        let mut later = passing_status(d);
        later.summary = "PASS (99✓ 0⚠)".to_string();
        assert_eq!(stamp_ledger(&path, &later).unwrap(), 0);

        let (_, rows) = read_table(&path).unwrap();
        for row in rows {
            let rec = WagerRecord::from_row(&row);
            assert_eq!(rec.audit_note, status.summary, "first stamp must win");
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_stamp_missing_ledger_is_zero() {
        let dir = temp_dir();
        let status = passing_status(day("2026-02-19"));
        let path = ledger_path(&dir, day("2026-02-19"));
        assert_eq!(stamp_ledger(&path, &status).unwrap(), 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    // -- backfill --

    fn write_v1_ledger(dir: &Path, date: &str) -> PathBuf {
        let path = dir.join(format!("wagers_{date}.csv"));
        let contents = "\
ID,Away,Home,Fair,Market,Edge,Kelly,Pick,Book,Odds,Bet,Result,Payout,Notes
1,Utah Jazz,Boston Celtics,-7.5,-5.5,2.0,1.8%,Boston Celtics,circa,-110,25,WIN,22.73,
2,Miami Heat,Denver Nuggets,-9.1,-8.0,1.1,0.9%,Denver Nuggets,dk,-110,10,LOSS,-10,late line move
";
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_backfill_migrates_and_notes_historical() {
        let dir = temp_dir();
        let path = write_v1_ledger(&dir, "2025-11-01");
        let today = day("2026-02-19");

        let summary = backfill_ledgers(&dir, today).unwrap();
        assert_eq!(summary.files_updated, 1);
        assert_eq!(summary.rows_noted, 2);

        let (header, rows) = read_table(&path).unwrap();
        assert_eq!(header.len(), 24);
        let rec = WagerRecord::from_row(&rows[0]);
        assert_eq!(rec.payout, "22.73");
        assert!(rec.audit_stamp.is_empty());
        assert!(rec.audit_note.contains("2025-11-01"));
        assert!(rec.audit_note.contains("retroactive validation"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_backfill_current_day_gets_actionable_note() {
        let dir = temp_dir();
        let today = day("2026-02-19");
        append_wager(&dir, today, sample_record("1"), None).unwrap();

        backfill_ledgers(&dir, today).unwrap();
        let (_, rows) = read_table(&ledger_path(&dir, today)).unwrap();
        let rec = WagerRecord::from_row(&rows[0]);
        assert!(rec.audit_stamp.is_empty());
        assert!(rec.audit_note.contains("run the audit"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_backfill_twice_is_byte_identical() {
        let dir = temp_dir();
        let path = write_v1_ledger(&dir, "2025-11-01");
        let today = day("2026-02-19");

        backfill_ledgers(&dir, today).unwrap();
        let first = std::fs::read(&path).unwrap();

        let summary = backfill_ledgers(&dir, today).unwrap();
        assert_eq!(summary.files_updated, 0);
        assert_eq!(summary.files_skipped, 1);
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_backfill_preserves_existing_stamps() {
        let dir = temp_dir();
        let d = day("2026-02-19");
        append_wager(&dir, d, sample_record("1"), Some(&passing_status(d))).unwrap();
        append_wager(&dir, d, sample_record("2"), None).unwrap();

        backfill_ledgers(&dir, d).unwrap();
        let (_, rows) = read_table(&ledger_path(&dir, d)).unwrap();
        let first = WagerRecord::from_row(&rows[0]);
        let second = WagerRecord::from_row(&rows[1]);
        assert!(first.is_stamped());
        assert!(first.audit_note.starts_with("PASS"));
        assert!(!second.is_stamped());
        assert!(second.audit_note.contains("run the audit"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_backfill_unknown_schema_fails_loudly() {
        let dir = temp_dir();
        let path = dir.join("wagers_2025-10-01.csv");
        std::fs::write(&path, "A,B,C\n1,2,3\n").unwrap();
        let err = backfill_ledgers(&dir, day("2026-02-19")).unwrap_err();
        assert!(err.to_string().contains("3 columns"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    // -- files --

    #[test]
    fn test_ledger_date_parsing() {
        assert_eq!(
            ledger_date(Path::new("/data/wagers_2026-02-19.csv")),
            Some(day("2026-02-19"))
        );
        assert_eq!(ledger_date(Path::new("/data/bankroll.json")), None);
        assert_eq!(ledger_date(Path::new("/data/wagers_notadate.csv")), None);
    }

    #[test]
    fn test_find_ledgers_sorted() {
        let dir = temp_dir();
        write_v1_ledger(&dir, "2026-01-02");
        write_v1_ledger(&dir, "2025-12-30");
        std::fs::write(dir.join("bankroll.json"), "{}").unwrap();

        let found = find_ledgers(&dir);
        assert_eq!(found.len(), 2);
        assert!(found[0].to_string_lossy().contains("2025-12-30"));
        assert!(found[1].to_string_lossy().contains("2026-01-02"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
