//! Wager ledger schema versions and migration.
//!
//! The ledger format grew column-by-column over its life; old files are
//! still on disk in every intermediate shape. Version detection is strictly
//! by column count, never by sniffing cell contents, and migration is
//! purely positional: each historical column moves to its canonical slot
//! and everything else is padded with the empty string. A padded column
//! never gets an inferred value.

use crate::types::FairlineError;
use std::path::Path;

/// The canonical column order every ledger migrates to.
pub const CANONICAL_COLUMNS: [&str; 24] = [
    "ID",
    "Timestamp",
    "Away",
    "Home",
    "Fair",
    "Market",
    "Edge",
    "Raw_Edge",
    "Edge_Capped",
    "Kelly",
    "Confidence",
    "Pick",
    "Type",
    "Book",
    "Odds",
    "Bet",
    "ToWin",
    "Result",
    "Payout",
    "Notes",
    "ClosingLine",
    "CLV",
    "AuditStamp",
    "AuditNote",
];

/// First ledger era: no timestamps, no confidence, flat spread bets only.
const V1_COLUMNS: [&str; 14] = [
    "ID", "Away", "Home", "Fair", "Market", "Edge", "Kelly", "Pick", "Book", "Odds", "Bet",
    "Result", "Payout", "Notes",
];

/// Added bet timestamps and the model confidence label.
const V2_COLUMNS: [&str; 16] = [
    "ID", "Timestamp", "Away", "Home", "Fair", "Market", "Edge", "Kelly", "Confidence", "Pick",
    "Book", "Odds", "Bet", "Result", "Payout", "Notes",
];

/// Added bet type and the to-win amount.
const V3_COLUMNS: [&str; 18] = [
    "ID", "Timestamp", "Away", "Home", "Fair", "Market", "Edge", "Kelly", "Confidence", "Pick",
    "Type", "Book", "Odds", "Bet", "ToWin", "Result", "Payout", "Notes",
];

/// Added the pre-cap edge and the capped flag.
const V4_COLUMNS: [&str; 20] = [
    "ID", "Timestamp", "Away", "Home", "Fair", "Market", "Edge", "Raw_Edge", "Edge_Capped",
    "Kelly", "Confidence", "Pick", "Type", "Book", "Odds", "Bet", "ToWin", "Result", "Payout",
    "Notes",
];

/// Added closing line tracking.
const V5_COLUMNS: [&str; 22] = [
    "ID", "Timestamp", "Away", "Home", "Fair", "Market", "Edge", "Raw_Edge", "Edge_Capped",
    "Kelly", "Confidence", "Pick", "Type", "Book", "Odds", "Bet", "ToWin", "Result", "Payout",
    "Notes", "ClosingLine", "CLV",
];

/// Every known version, detected by column count.
pub fn layout_for(column_count: usize) -> Option<&'static [&'static str]> {
    match column_count {
        14 => Some(&V1_COLUMNS),
        16 => Some(&V2_COLUMNS),
        18 => Some(&V3_COLUMNS),
        20 => Some(&V4_COLUMNS),
        22 => Some(&V5_COLUMNS),
        24 => Some(&CANONICAL_COLUMNS),
        _ => None,
    }
}

/// Whether a header already has the canonical shape.
pub fn is_canonical(header: &[String]) -> bool {
    header.len() == CANONICAL_COLUMNS.len()
        && header.iter().zip(CANONICAL_COLUMNS.iter()).all(|(a, b)| a == b)
}

/// Migrate one row from a known layout into canonical order. Ragged rows
/// (fewer cells than the layout) are padded as they are read.
fn migrate_row(row: &[String], layout: &[&str]) -> Vec<String> {
    CANONICAL_COLUMNS
        .iter()
        .map(|col| {
            layout
                .iter()
                .position(|c| c == col)
                .and_then(|i| row.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}

/// Migrate a whole table to the canonical layout. The version is detected
/// from the header length alone; an unknown count fails loudly so the
/// operator resolves it by hand instead of the tool guessing.
pub fn migrate_table(
    path: &Path,
    header: &[String],
    rows: &[Vec<String>],
) -> Result<(Vec<String>, Vec<Vec<String>>), FairlineError> {
    let layout =
        layout_for(header.len()).ok_or_else(|| FairlineError::SchemaVersionUnrecognized {
            path: path.display().to_string(),
            columns: header.len(),
        })?;

    let canonical_header: Vec<String> = CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect();
    let migrated = rows.iter().map(|row| migrate_row(row, layout)).collect();
    Ok((canonical_header, migrated))
}

/// Canonical index of a column name.
pub fn column_index(name: &str) -> Option<usize> {
    CANONICAL_COLUMNS.iter().position(|c| *c == name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
