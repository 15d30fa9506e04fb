//! Audit section 12: pipeline files and collector wiring.
//!
//! Verifies the machinery around the feeds: the data directory itself, the
//! collector commands fix mode depends on, the internal consistency of the
//! static team table, and the audit-status slot.

use std::path::Path;

use super::SECTION_PIPELINE;
use crate::config::AppConfig;
use crate::feeds::FeedKind;
use crate::storage;
use crate::teams;
use crate::types::{CheckResult, SectionReport};

pub fn audit_pipeline(config: &AppConfig, data_dir: &Path) -> SectionReport {
    let mut s = SectionReport::new(SECTION_PIPELINE);

    if data_dir.is_dir() {
        s.push(CheckResult::pass(
            "pipeline.data_dir",
            format!("Data directory present: {}", data_dir.display()),
        ));
    } else {
        s.push(
            CheckResult::fail(
                "pipeline.data_dir",
                format!("Data directory missing: {}", data_dir.display()),
            )
            .with_fix("Create it or point [data].dir in config.toml at the right place"),
        );
    }

    // Every feed needs a configured collector for fix mode to work
    let unconfigured: Vec<String> = FeedKind::ALL
        .iter()
        .filter(|k| !config.collectors.contains_key(k.collector_key()))
        .map(|k| k.collector_key().to_string())
        .collect();
    if unconfigured.is_empty() {
        s.push(CheckResult::pass(
            "pipeline.collectors",
            format!("All {} collector commands configured", FeedKind::ALL.len()),
        ));
    } else {
        s.push(
            CheckResult::fail(
                "pipeline.collectors",
                format!("{} collector command(s) missing", unconfigured.len()),
            )
            .with_details(vec![format!("Missing: {}", unconfigured.join(", "))])
            .with_fix("Add the missing entries to [collectors] in config.toml"),
        );
    }

    // The canonical team table everything resolves through
    if teams::table_is_consistent() {
        s.push(CheckResult::pass(
            "pipeline.team_table",
            format!("{} teams, ids and names unique", teams::TEAM_COUNT),
        ));
    } else {
        s.push(CheckResult::fail(
            "pipeline.team_table",
            "Static team table inconsistent (duplicate id, name, or abbreviation)",
        ));
    }

    // Status slot: informational only
    match storage::load_status(data_dir) {
        Ok(Some(status)) => {
            s.push(CheckResult::pass(
                "pipeline.status_slot",
                format!("Last audit: {status}"),
            ));
        }
        Ok(None) => {
            s.push(CheckResult::warn(
                "pipeline.status_slot",
                "No prior audit status recorded",
            ));
        }
        Err(e) => {
            s.push(CheckResult::warn(
                "pipeline.status_slot",
                format!("Status slot unreadable: {e}"),
            ));
        }
    }

    s
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
