//! Core data models for the headlines reader
//!
//! This module contains the article type shown by every screen, the rule that
//! decides which articles are fit to display, and the NewsAPI client that
//! produces them.

pub mod news;

pub use news::{Category, NewsClient, NewsError, NewsQuery};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder NewsAPI substitutes for articles that were taken down
pub const REMOVED_SENTINEL: &str = "[Removed]";

/// A single news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Headline
    pub title: String,
    /// Short summary
    pub description: String,
    /// Canonical link to the article
    pub url: String,
    /// Lead image, if the publisher provided one
    pub image_url: Option<String>,
    /// Publication time
    pub published_at: Option<DateTime<Utc>>,
    /// Name of the publishing outlet
    pub source_name: String,
    /// Byline
    pub author: Option<String>,
    /// Truncated body text
    pub content: Option<String>,
}

impl Article {
    /// Whether this article may be displayed or cached
    ///
    /// Title and description must both be present and neither may be the
    /// `[Removed]` placeholder.
    pub fn is_displayable(&self) -> bool {
        is_meaningful(&self.title) && is_meaningful(&self.description)
    }

    /// Identity for list rendering
    ///
    /// URLs repeat across pages, so the row position is part of the key.
    pub fn list_key(&self, position: usize) -> String {
        format!("{}#{}", self.url, position)
    }
}

fn is_meaningful(field: &str) -> bool {
    let trimmed = field.trim();
    !trimmed.is_empty() && trimmed != REMOVED_SENTINEL
}

/// Drops every article that fails [`Article::is_displayable`], keeping order
pub fn filter_articles(articles: Vec<Article>) -> Vec<Article> {
    articles
        .into_iter()
        .filter(Article::is_displayable)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(title: &str, description: &str) -> Article {
        Article {
            title: title.to_string(),
            description: description.to_string(),
            url: format!("https://example.com/{}", title.replace(' ', "-")),
            image_url: None,
            published_at: Some(Utc.with_ymd_and_hms(2024, 7, 15, 14, 0, 0).unwrap()),
            source_name: "Example News".to_string(),
            author: None,
            content: None,
        }
    }

    #[test]
    fn test_complete_article_is_displayable() {
        assert!(article("Markets rally", "Stocks closed higher").is_displayable());
    }

    #[test]
    fn test_missing_title_or_description_is_not_displayable() {
        assert!(!article("", "Stocks closed higher").is_displayable());
        assert!(!article("Markets rally", "").is_displayable());
        assert!(!article("   ", "Stocks closed higher").is_displayable());
    }

    #[test]
    fn test_removed_sentinel_is_not_displayable() {
        assert!(!article("[Removed]", "Stocks closed higher").is_displayable());
        assert!(!article("Markets rally", "[Removed]").is_displayable());
    }

    #[test]
    fn test_sentinel_inside_text_is_fine() {
        assert!(article("Markets rally", "Comment [Removed] by moderator").is_displayable());
    }

    #[test]
    fn test_filter_keeps_valid_articles_in_order() {
        let articles = vec![
            article("First", "one"),
            article("[Removed]", "[Removed]"),
            article("Second", "two"),
            article("Third", ""),
            article("Fourth", "four"),
        ];

        let filtered = filter_articles(articles);
        let titles: Vec<&str> = filtered.iter().map(|a| a.title.as_str()).collect();

        assert_eq!(titles, vec!["First", "Second", "Fourth"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let articles = vec![
            article("First", "one"),
            article("", "missing title"),
            article("Second", "[Removed]"),
            article("Third", "three"),
        ];

        let once = filter_articles(articles);
        let twice = filter_articles(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_of_all_invalid_is_empty() {
        let articles = vec![article("[Removed]", "x"), article("", "")];
        assert!(filter_articles(articles).is_empty());
    }

    #[test]
    fn test_list_key_distinguishes_repeated_urls() {
        let a = article("Same", "story");
        assert_ne!(a.list_key(0), a.list_key(20));
        assert!(a.list_key(3).starts_with(&a.url));
    }
}
