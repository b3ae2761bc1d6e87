use futures::future::BoxFuture;

use crate::data::{Article, NewsError};

/// Anything that can serve numbered pages of articles
///
/// Pages are 1-based. Returned articles are unfiltered.
pub trait FeedSource: Send + Sync {
    fn fetch_page(&self, page: u32, page_size: u32)
        -> BoxFuture<'_, Result<Vec<Article>, NewsError>>;
}
