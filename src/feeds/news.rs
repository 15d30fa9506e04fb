//! News feed — cached league headlines used for late-breaking signals.

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::Path;

use super::{parse_timestamp, read_feed_file, FeedKind};
use crate::types::FairlineError;

#[derive(Debug, Clone, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

impl NewsArticle {
    /// Lowercased title + summary for keyword scanning.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.summary).to_lowercase()
    }
}

#[derive(Debug, Deserialize)]
struct NewsFile {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

/// Parsed news cache.
#[derive(Debug, Clone)]
pub struct NewsFeed {
    pub timestamp: Option<NaiveDateTime>,
    pub articles: Vec<NewsArticle>,
}

pub fn load(path: &Path) -> Result<NewsFeed, FairlineError> {
    let contents = read_feed_file(path, FeedKind::News)?;
    let file: NewsFile =
        serde_json::from_str(&contents).map_err(|e| FairlineError::FeedMalformed {
            feed: FeedKind::News.to_string(),
            message: e.to_string(),
        })?;
    Ok(NewsFeed {
        timestamp: file.timestamp.as_deref().and_then(parse_timestamp),
        articles: file.articles,
    })
}
