//! Feed orchestration
//!
//! Decides when the article list is served from the cache and when it is
//! fetched, merges pages as the reader scrolls, and recovers from failed
//! fetches without ever blanking the screen.

mod controller;
mod source;

pub use controller::{
    near_end, FeedController, FeedPhase, FetchKind, FetchTicket, Notice, Pagination,
    FEED_CACHE_KEY, OFFLINE_BANNER,
};
pub use source::FeedSource;

use std::time::Duration;

/// Tunables for a feed screen
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Articles requested per page
    pub page_size: u32,
    /// How long the first page stays fresh in the cache
    pub cache_ttl: Duration,
    /// Load the next page once the selection is within this fraction of a
    /// screenful from the end of the list
    pub load_more_threshold: f32,
    /// How long transient notifications stay on screen
    pub notice_duration: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            cache_ttl: Duration::from_secs(300), // 5 minutes
            load_more_threshold: 0.5,
            notice_duration: Duration::from_secs(4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_config_default() {
        let config = FeedConfig::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!((config.load_more_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.notice_duration, Duration::from_secs(4));
    }

    #[test]
    fn test_feed_config_custom() {
        let config = FeedConfig {
            page_size: 50,
            cache_ttl: Duration::from_secs(60),
            ..Default::default()
        };
        assert_eq!(config.page_size, 50);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }
}
