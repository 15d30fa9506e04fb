//! Collector boundary.
//!
//! The scrapers that populate the feed caches are external programs; the
//! audit core never fetches anything itself. Fix mode re-invokes them
//! through this trait and must tolerate arbitrarily slow or failing
//! collectors without losing the audit results already collected.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::feeds::FeedKind;
use crate::types::FairlineError;

/// Abstraction over feed re-fetching.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Refresh one feed's cache. An error means the feed could not be
    /// refreshed; it never aborts the caller's run.
    async fn refresh(&self, feed: FeedKind) -> Result<(), FairlineError>;
}

/// Runs the per-feed shell commands from the `[collectors]` config table.
pub struct CommandCollector {
    commands: HashMap<String, String>,
}

impl CommandCollector {
    pub fn new(commands: HashMap<String, String>) -> Self {
        Self { commands }
    }

    pub fn has_command(&self, feed: FeedKind) -> bool {
        self.commands.contains_key(feed.collector_key())
    }
}

#[async_trait]
impl Collector for CommandCollector {
    async fn refresh(&self, feed: FeedKind) -> Result<(), FairlineError> {
        let command = self.commands.get(feed.collector_key()).ok_or_else(|| {
            FairlineError::CollectorUnavailable {
                feed: feed.to_string(),
                message: "no collector command configured".to_string(),
            }
        })?;

        info!(%feed, command, "Running collector");
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| FairlineError::CollectorUnavailable {
                feed: feed.to_string(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            info!(%feed, "Collector finished");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(%feed, status = ?output.status.code(), "Collector failed");
            Err(FairlineError::CollectorUnavailable {
                feed: feed.to_string(),
                message: format!(
                    "exit status {:?}: {}",
                    output.status.code(),
                    stderr.chars().take(200).collect::<String>()
                ),
            })
        }
    }
}

/// Refresh a set of feeds, tolerating individual failures. Returns the
/// feeds that actually refreshed.
pub async fn refresh_feeds(collector: &dyn Collector, feeds: &[FeedKind]) -> Vec<FeedKind> {
    let mut refreshed = Vec::new();
    for feed in feeds {
        match collector.refresh(*feed).await {
            Ok(()) => refreshed.push(*feed),
            Err(e) => warn!(feed = %feed, error = %e, "Collector refresh failed, continuing"),
        }
    }
    refreshed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn collector_with(entries: &[(&str, &str)]) -> CommandCollector {
        CommandCollector::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_successful_command() {
        let collector = collector_with(&[("odds", "true")]);
        assert!(collector.refresh(FeedKind::Odds).await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_command_is_error_not_panic() {
        let collector = collector_with(&[("odds", "false")]);
        let err = collector.refresh(FeedKind::Odds).await.unwrap_err();
        assert!(matches!(err, FairlineError::CollectorUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_unconfigured_feed() {
        let collector = collector_with(&[]);
        assert!(!collector.has_command(FeedKind::Ratings));
        let err = collector.refresh(FeedKind::Ratings).await.unwrap_err();
        assert!(matches!(err, FairlineError::CollectorUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_refresh_feeds_continues_past_failures() {
        let collector = collector_with(&[("odds", "true"), ("ratings", "false")]);
        let refreshed = refresh_feeds(
            &collector,
            &[FeedKind::Ratings, FeedKind::Odds, FeedKind::News],
        )
        .await;
        // Ratings failed, news unconfigured, odds succeeded
        assert_eq!(refreshed, vec![FeedKind::Odds]);
    }
}
