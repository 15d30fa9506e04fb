//! Persistence for the audit-status slot.
//!
//! A single JSON file holds the most recent audit outcome. It is the only
//! state that must survive a process restart: wagers logged between audits
//! inherit it at creation time. Most-recent-wins: every completed audit
//! overwrites the slot.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::AuditStatus;

/// Slot file name inside the data directory.
pub const STATUS_FILE: &str = ".audit_status.json";

pub fn status_path(data_dir: &Path) -> std::path::PathBuf {
    data_dir.join(STATUS_FILE)
}

/// Write the slot (most-recent-wins).
pub fn save_status(data_dir: &Path, status: &AuditStatus) -> Result<()> {
    let path = status_path(data_dir);
    let json = serde_json::to_string_pretty(status)
        .context("Failed to serialise audit status")?;
    std::fs::write(&path, &json)
        .with_context(|| format!("Failed to write audit status to {}", path.display()))?;
    debug!(path = %path.display(), passed = status.passed, "Audit status saved");
    Ok(())
}

/// Load the slot. Returns None if no audit has ever completed here.
pub fn load_status(data_dir: &Path) -> Result<Option<AuditStatus>> {
    let path = status_path(data_dir);
    if !path.exists() {
        info!(path = %path.display(), "No audit status found");
        return Ok(None);
    }
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read audit status from {}", path.display()))?;
    let status: AuditStatus = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse audit status from {}", path.display()))?;
    Ok(Some(status))
}

/// Delete the slot (for testing or reset).
pub fn delete_status(data_dir: &Path) -> Result<()> {
    let path = status_path(data_dir);
    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to delete status file {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuditReport, CheckResult, SectionReport};
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("fairline_status_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&p).unwrap();
        p
    }

    fn passing_status() -> AuditStatus {
        let mut report = AuditReport::new();
        let mut section = SectionReport::new("feeds");
        section.push(CheckResult::pass("feeds.ok", "fine"));
        report.sections.push(section);
        AuditStatus::from_report(&report)
    }

    #[test]
    fn test_save_and_load() {
        let dir = temp_dir();
        let status = passing_status();
        save_status(&dir, &status).unwrap();

        let loaded = load_status(&dir).unwrap().unwrap();
        assert!(loaded.passed);
        assert_eq!(loaded.summary, status.summary);
        assert_eq!(loaded.date, status.date);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_nonexistent() {
        let dir = temp_dir();
        assert!(load_status(&dir).unwrap().is_none());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_most_recent_wins() {
        let dir = temp_dir();
        let first = passing_status();
        save_status(&dir, &first).unwrap();

        let mut second = passing_status();
        second.passed = false;
        second.summary = "FAIL (2✗ 0⚠)".to_string();
        save_status(&dir, &second).unwrap();

        let loaded = load_status(&dir).unwrap().unwrap();
        assert!(!loaded.passed);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_delete_status() {
        let dir = temp_dir();
        save_status(&dir, &passing_status()).unwrap();
        assert!(status_path(&dir).exists());
        delete_status(&dir).unwrap();
        assert!(!status_path(&dir).exists());
        // Deleting again is fine
        delete_status(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
