//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The betting parameters (bankroll, unit size, edge cap) live in their own
//! `bankroll.json` feed next to the data caches, because the operator edits
//! them between sessions without touching the tool config.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default staleness threshold for feed caches, in hours.
pub const DEFAULT_STALE_HOURS: f64 = 18.0;

/// Default edge cap in points when bankroll.json is missing or incomplete.
pub const DEFAULT_EDGE_CAP: f64 = 10.0;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    /// Feed name → shell command that refreshes it. Used by fix mode only.
    #[serde(default)]
    pub collectors: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Directory holding all feed caches and wager ledgers.
    pub dir: PathBuf,
    #[serde(default = "default_stale_hours")]
    pub stale_hours: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    /// Maximum number of scheduled games the model spot-check runs.
    #[serde(default = "default_spot_check_games")]
    pub spot_check_games: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            spot_check_games: default_spot_check_games(),
        }
    }
}

fn default_stale_hours() -> f64 {
    DEFAULT_STALE_HOURS
}

fn default_spot_check_games() -> usize {
    5
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// A config rooted at the given data directory with no collectors.
    /// Used by tests and as a fallback when config.toml is absent.
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data: DataConfig {
                dir: dir.into(),
                stale_hours: DEFAULT_STALE_HOURS,
            },
            audit: AuditConfig::default(),
            collectors: HashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bankroll feed
// ---------------------------------------------------------------------------

/// Betting configuration feed: `bankroll.json` in the data directory.
#[derive(Debug, Deserialize, Clone)]
pub struct BankrollConfig {
    pub starting_bankroll: f64,
    pub unit_size: f64,
    #[serde(default = "default_edge_cap")]
    pub edge_cap: f64,
}

fn default_edge_cap() -> f64 {
    DEFAULT_EDGE_CAP
}

impl BankrollConfig {
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("bankroll.json");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read bankroll config: {}", path.display()))?;
        let config: BankrollConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse bankroll config: {}", path.display()))?;
        Ok(config)
    }

    /// Just the edge cap, falling back to the default when the feed is
    /// missing or malformed. The predictor must keep working without it;
    /// the auditor reports the underlying problem separately.
    pub fn edge_cap_or_default(data_dir: &Path) -> f64 {
        Self::load(data_dir).map(|c| c.edge_cap).unwrap_or(DEFAULT_EDGE_CAP)
    }
}
