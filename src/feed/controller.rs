//! Feed controller state machine
//!
//! The controller owns the article list and pagination for one screen. Each
//! operation is split in two: a `begin_*` call decides whether a fetch is
//! needed and hands out a [`FetchTicket`], and [`FeedController::complete`]
//! applies the outcome. This lets a refresh and a load-more be in flight at
//! the same time while the controller itself stays on one thread.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use log::{debug, info, warn};

use super::FeedSource;
use crate::cache::{Clock, SystemClock, TtlCache};
use crate::data::{filter_articles, Article, NewsError};

/// Cache key for the first page of the feed
pub const FEED_CACHE_KEY: &str = "top_headlines_page_1";

/// Banner shown when the initial load failed but cached articles exist
pub const OFFLINE_BANNER: &str = "Showing cached articles (offline mode)";

/// Lifecycle of a feed screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// Not yet activated
    Idle,
    /// Initial load in progress
    Loading,
    /// Steady state
    Ready,
    /// Initial load failed; showing cached articles or nothing
    Degraded,
}

/// Cursor into the remote list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Next 1-based page to request
    pub next_page: u32,
    /// False once a short page has been seen
    pub has_more: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            next_page: 1,
            has_more: true,
        }
    }
}

impl Pagination {
    /// State after a freshly fetched first page of `count` articles
    pub fn first_page(count: usize, page_size: u32) -> Self {
        Self {
            next_page: 2,
            has_more: count >= page_size as usize,
        }
    }

    /// State after serving the first page from the cache
    ///
    /// Cached pages are already filtered, so their length says nothing about
    /// whether the remote list continues.
    pub fn resumed() -> Self {
        Self {
            next_page: 2,
            has_more: true,
        }
    }

    /// Move past a page of `count` articles
    ///
    /// A short page latches `has_more` off; only a new first page re-arms it.
    pub fn advance(&mut self, count: usize, page_size: u32) {
        self.next_page += 1;
        self.has_more = self.has_more && count >= page_size as usize;
    }
}

/// Which operation a fetch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initial,
    Refresh,
    LoadMore,
}

/// A fetch the controller has asked for
///
/// The ticket is handed back to [`FeedController::complete`] together with the
/// fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub kind: FetchKind,
    pub page: u32,
    pub page_size: u32,
    generation: u64,
}

impl FetchTicket {
    /// Feed generation the ticket was issued under
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Runs the fetch against `source`
    pub fn fetch<'a>(
        &self,
        source: &'a dyn FeedSource,
    ) -> BoxFuture<'a, Result<Vec<Article>, NewsError>> {
        source.fetch_page(self.page, self.page_size)
    }
}

/// A dismissable message about a failed refresh or load-more
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Fetch, paginate and recover for one paginated article list
pub struct FeedController {
    cache: Arc<TtlCache<Vec<Article>>>,
    clock: Arc<dyn Clock>,
    page_size: u32,
    phase: FeedPhase,
    articles: Vec<Article>,
    pagination: Pagination,
    loading: bool,
    refreshing: bool,
    loading_more: bool,
    banner: Option<String>,
    notice: Option<Notice>,
    /// Bumped whenever a new first page is installed; load-more results
    /// issued under an older generation are dropped
    generation: u64,
    last_updated: Option<DateTime<Utc>>,
}

impl FeedController {
    /// Creates a controller that timestamps notices with the system clock
    pub fn new(cache: Arc<TtlCache<Vec<Article>>>, page_size: u32) -> Self {
        Self::with_clock(cache, page_size, Arc::new(SystemClock))
    }

    /// Creates a controller with an injected clock
    pub fn with_clock(
        cache: Arc<TtlCache<Vec<Article>>>,
        page_size: u32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache,
            clock,
            page_size: page_size.max(1),
            phase: FeedPhase::Idle,
            articles: Vec::new(),
            pagination: Pagination::default(),
            loading: false,
            refreshing: false,
            loading_more: false,
            banner: None,
            notice: None,
            generation: 0,
            last_updated: None,
        }
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    /// Articles currently on screen
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Initial load in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    /// Persistent error text from a failed initial load
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Transient error from a failed refresh or load-more
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// When the first page on screen was captured
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Starts the screen
    ///
    /// Serves a fresh, non-empty cached first page directly and returns
    /// `None`. Otherwise returns a ticket for page 1. Only valid once; later
    /// calls return `None`.
    pub fn begin_activate(&mut self) -> Option<FetchTicket> {
        if self.phase != FeedPhase::Idle {
            return None;
        }
        self.phase = FeedPhase::Loading;

        if self.cache.has(FEED_CACHE_KEY) {
            if let Some(cached) = self.cache.get(FEED_CACHE_KEY) {
                let cached = filter_articles(cached);
                if !cached.is_empty() {
                    debug!("serving {} cached articles", cached.len());
                    self.last_updated = self.cache.peek(FEED_CACHE_KEY).map(|c| c.cached_at);
                    self.articles = cached;
                    self.pagination = Pagination::resumed();
                    self.phase = FeedPhase::Ready;
                    return None;
                }
            }
        }

        self.loading = true;
        Some(self.ticket(FetchKind::Initial, 1))
    }

    /// Starts a pull-to-refresh
    ///
    /// Always refetches page 1, ignoring the cache. Returns `None` while
    /// another refresh is running or before the initial load has finished.
    pub fn begin_refresh(&mut self) -> Option<FetchTicket> {
        if self.refreshing || matches!(self.phase, FeedPhase::Idle | FeedPhase::Loading) {
            return None;
        }

        self.refreshing = true;
        Some(self.ticket(FetchKind::Refresh, 1))
    }

    /// Starts loading the next page
    ///
    /// Returns `None` while a load-more is already in flight, once the end of
    /// the feed has been reached, or outside the `Ready` phase.
    pub fn begin_load_more(&mut self) -> Option<FetchTicket> {
        if self.phase != FeedPhase::Ready || self.loading_more || !self.pagination.has_more {
            return None;
        }

        self.loading_more = true;
        Some(self.ticket(FetchKind::LoadMore, self.pagination.next_page))
    }

    /// Applies the outcome of a fetch started by one of the `begin_*` calls
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<Vec<Article>, NewsError>) {
        match ticket.kind {
            FetchKind::Initial => self.complete_initial(ticket, result),
            FetchKind::Refresh => self.complete_refresh(ticket, result),
            FetchKind::LoadMore => self.complete_load_more(ticket, result),
        }
    }

    /// Activation followed by the fetch it asks for, if any
    pub async fn activate(&mut self, source: &dyn FeedSource) {
        if let Some(ticket) = self.begin_activate() {
            let result = ticket.fetch(source).await;
            self.complete(ticket, result);
        }
    }

    /// Refresh and wait for it to finish
    pub async fn refresh(&mut self, source: &dyn FeedSource) {
        if let Some(ticket) = self.begin_refresh() {
            let result = ticket.fetch(source).await;
            self.complete(ticket, result);
        }
    }

    /// Load the next page and wait for it to finish
    pub async fn load_more(&mut self, source: &dyn FeedSource) {
        if let Some(ticket) = self.begin_load_more() {
            let result = ticket.fetch(source).await;
            self.complete(ticket, result);
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Drops the notice once it has been shown for `max_age`
    pub fn expire_notice(&mut self, max_age: Duration) {
        let now = self.clock.now();
        if self
            .notice
            .as_ref()
            .is_some_and(|notice| now - notice.raised_at >= max_age)
        {
            self.notice = None;
        }
    }

    fn ticket(&self, kind: FetchKind, page: u32) -> FetchTicket {
        FetchTicket {
            kind,
            page,
            page_size: self.page_size,
            generation: self.generation,
        }
    }

    fn complete_initial(&mut self, ticket: FetchTicket, result: Result<Vec<Article>, NewsError>) {
        self.loading = false;

        match result {
            Ok(page) => {
                let articles = filter_articles(page);
                info!("loaded first page: {} articles", articles.len());
                self.replace_first_page(articles, ticket.page_size);
                self.banner = None;
                self.phase = FeedPhase::Ready;
            }
            Err(e) => {
                warn!("initial load failed: {}", e);
                self.phase = FeedPhase::Degraded;
                self.fall_back_to_cache(&e);
            }
        }
    }

    fn complete_refresh(&mut self, ticket: FetchTicket, result: Result<Vec<Article>, NewsError>) {
        self.refreshing = false;

        match result {
            Ok(page) => {
                let articles = filter_articles(page);
                info!("refreshed first page: {} articles", articles.len());
                self.replace_first_page(articles, ticket.page_size);
                self.banner = None;
                self.phase = FeedPhase::Ready;
            }
            Err(e) => {
                warn!("refresh failed: {}", e);
                self.raise_notice(format!("Refresh failed: {}", e));
            }
        }
    }

    fn complete_load_more(&mut self, ticket: FetchTicket, result: Result<Vec<Article>, NewsError>) {
        // A newer first page already cleared `loading_more` and may have
        // issued its own load-more since.
        if ticket.generation != self.generation {
            debug!(
                "discarding page {} fetched for a replaced list",
                ticket.page
            );
            return;
        }
        self.loading_more = false;

        match result {
            Ok(page) => {
                let page = filter_articles(page);
                let count = page.len();
                self.articles.extend(page);
                self.pagination.advance(count, ticket.page_size);
                info!(
                    "loaded page {}: {} articles (has_more = {})",
                    ticket.page, count, self.pagination.has_more
                );
            }
            Err(e) => {
                warn!("loading page {} failed: {}", ticket.page, e);
                self.raise_notice(format!("Couldn't load more articles: {}", e));
            }
        }
    }

    /// Installs a new first page on screen and in the cache
    ///
    /// Starts a new generation, so any load-more still in flight for the old
    /// list is discarded when it lands.
    fn replace_first_page(&mut self, articles: Vec<Article>, page_size: u32) {
        self.generation += 1;
        self.loading_more = false;
        self.cache.set(FEED_CACHE_KEY, articles.clone());
        self.pagination = Pagination::first_page(articles.len(), page_size);
        self.last_updated = Some(self.clock.now());
        self.articles = articles;
    }

    /// Shows whatever the cache holds, stale or not
    fn fall_back_to_cache(&mut self, error: &NewsError) {
        match self.cache.peek(FEED_CACHE_KEY) {
            Some(cached) if !cached.data.is_empty() => {
                info!(
                    "falling back to {} cached articles (expired = {})",
                    cached.data.len(),
                    cached.is_expired
                );
                self.articles = filter_articles(cached.data);
                self.pagination = Pagination::resumed();
                self.last_updated = Some(cached.cached_at);
                self.banner = Some(OFFLINE_BANNER.to_string());
            }
            _ => {
                self.articles.clear();
                self.banner = Some(format!("Failed to load articles: {}", error));
            }
        }
    }

    fn raise_notice(&mut self, message: String) {
        self.notice = Some(Notice {
            message,
            raised_at: self.clock.now(),
        });
    }
}

/// Whether the selection is close enough to the end to load the next page
///
/// `threshold` is measured in screenfuls: with 10 visible rows and a threshold
/// of 0.5, the next page is requested once 5 or fewer rows remain below the
/// selection.
pub fn near_end(selected: usize, len: usize, visible_rows: usize, threshold: f32) -> bool {
    if len == 0 {
        return false;
    }
    let remaining = len.saturating_sub(selected + 1);
    remaining as f32 <= visible_rows.max(1) as f32 * threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use chrono::TimeZone;

    fn article(n: usize) -> Article {
        Article {
            title: format!("Story {}", n),
            description: format!("Summary {}", n),
            url: format!("https://example.com/{}", n),
            image_url: None,
            published_at: None,
            source_name: "Wire".to_string(),
            author: None,
            content: None,
        }
    }

    fn articles(range: std::ops::Range<usize>) -> Vec<Article> {
        range.map(article).collect()
    }

    fn create_controller(page_size: u32) -> (FeedController, Arc<TtlCache<Vec<Article>>>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap());
        let cache = Arc::new(TtlCache::with_clock(
            Duration::seconds(300),
            Arc::new(clock.clone()),
        ));
        let controller =
            FeedController::with_clock(Arc::clone(&cache), page_size, Arc::new(clock.clone()));
        (controller, cache, clock)
    }

    fn ready_controller(page_size: u32, first_page: usize) -> FeedController {
        let (mut controller, _cache, _clock) = create_controller(page_size);
        let ticket = controller.begin_activate().expect("Empty cache should fetch");
        controller.complete(ticket, Ok(articles(0..first_page)));
        controller
    }

    #[test]
    fn test_pagination_first_page() {
        assert_eq!(
            Pagination::first_page(20, 20),
            Pagination { next_page: 2, has_more: true }
        );
        assert_eq!(
            Pagination::first_page(7, 20),
            Pagination { next_page: 2, has_more: false }
        );
    }

    #[test]
    fn test_pagination_advance_latches_has_more() {
        let mut pagination = Pagination::first_page(20, 20);

        pagination.advance(12, 20);
        assert_eq!(pagination.next_page, 3);
        assert!(!pagination.has_more);

        pagination.advance(20, 20);
        assert!(!pagination.has_more, "A full page must not re-arm has_more");
    }

    #[test]
    fn test_activate_only_once() {
        let (mut controller, _cache, _clock) = create_controller(20);

        assert!(controller.begin_activate().is_some());
        assert_eq!(controller.phase(), FeedPhase::Loading);
        assert!(controller.is_loading());
        assert!(controller.begin_activate().is_none());
    }

    #[test]
    fn test_activate_ignores_empty_cached_page() {
        let (mut controller, cache, _clock) = create_controller(20);
        cache.set(FEED_CACHE_KEY, Vec::new());

        let ticket = controller.begin_activate();

        assert_eq!(ticket.map(|t| t.page), Some(1));
    }

    #[test]
    fn test_refresh_rejected_before_initial_load_finishes() {
        let (mut controller, _cache, _clock) = create_controller(20);
        assert!(controller.begin_refresh().is_none());

        controller.begin_activate();
        assert!(controller.begin_refresh().is_none());
    }

    #[test]
    fn test_overlapping_refreshes_are_rejected() {
        let mut controller = ready_controller(20, 20);

        assert!(controller.begin_refresh().is_some());
        assert!(controller.begin_refresh().is_none());
    }

    #[test]
    fn test_load_more_and_refresh_can_overlap() {
        let mut controller = ready_controller(20, 20);

        let more = controller.begin_load_more();
        let refresh = controller.begin_refresh();

        assert!(more.is_some());
        assert!(refresh.is_some());
        assert!(controller.is_loading_more());
        assert!(controller.is_refreshing());
    }

    #[test]
    fn test_load_more_from_before_refresh_is_discarded() {
        let mut controller = ready_controller(20, 20);

        let more = controller.begin_load_more().unwrap();
        let refresh = controller.begin_refresh().unwrap();

        controller.complete(refresh, Ok(articles(100..120)));
        controller.complete(more, Ok(articles(20..40)));

        assert_eq!(controller.articles().len(), 20);
        assert_eq!(controller.articles()[0].title, "Story 100");
        assert_eq!(controller.pagination().next_page, 2);
        assert!(!controller.is_loading_more());
    }

    #[test]
    fn test_load_more_started_during_refresh_is_discarded() {
        let mut controller = ready_controller(20, 20);
        let second = controller.begin_load_more().unwrap();
        controller.complete(second, Ok(articles(20..40)));

        let refresh = controller.begin_refresh().unwrap();
        let more = controller.begin_load_more().unwrap();
        assert_eq!(more.page, 3);

        controller.complete(refresh, Ok(articles(100..120)));
        controller.complete(more, Ok(articles(40..60)));

        assert_eq!(controller.articles().len(), 20);
        assert_eq!(controller.pagination().next_page, 2);
        assert_eq!(controller.begin_load_more().map(|t| t.page), Some(2));
    }

    #[test]
    fn test_new_load_more_is_not_cleared_by_stale_completion() {
        let mut controller = ready_controller(20, 20);

        let stale = controller.begin_load_more().unwrap();
        let refresh = controller.begin_refresh().unwrap();
        controller.complete(refresh, Ok(articles(100..120)));

        let fresh = controller.begin_load_more().unwrap();
        controller.complete(stale, Ok(articles(20..40)));
        assert!(controller.is_loading_more());
        assert!(controller.begin_load_more().is_none());

        controller.complete(fresh, Ok(articles(120..140)));
        assert_eq!(controller.articles().len(), 40);
        assert_eq!(controller.articles()[20].title, "Story 120");
        assert_eq!(controller.pagination().next_page, 3);
    }

    #[test]
    fn test_failed_refresh_keeps_in_flight_load_more() {
        let mut controller = ready_controller(20, 20);

        let more = controller.begin_load_more().unwrap();
        let refresh = controller.begin_refresh().unwrap();
        controller.complete(refresh, Err(NewsError::HttpStatus(500)));
        controller.complete(more, Ok(articles(20..40)));

        assert_eq!(controller.articles().len(), 40);
        assert_eq!(controller.pagination().next_page, 3);
    }

    #[test]
    fn test_load_more_uses_next_page_number() {
        let mut controller = ready_controller(20, 20);

        let first = controller.begin_load_more().unwrap();
        assert_eq!(first.page, 2);
        controller.complete(first, Ok(articles(20..40)));

        let second = controller.begin_load_more().unwrap();
        assert_eq!(second.page, 3);
    }

    #[test]
    fn test_page_filtered_to_nothing_ends_the_feed() {
        let mut controller = ready_controller(5, 5);
        let mut removed = article(9);
        removed.title = "[Removed]".to_string();

        let ticket = controller.begin_load_more().unwrap();
        controller.complete(ticket, Ok(vec![removed; 5]));

        assert_eq!(controller.articles().len(), 5);
        assert!(!controller.pagination().has_more);
    }

    #[test]
    fn test_notice_expires_after_max_age() {
        let (mut controller, _cache, clock) = create_controller(20);
        let ticket = controller.begin_activate().unwrap();
        controller.complete(ticket, Ok(articles(0..20)));

        let ticket = controller.begin_refresh().unwrap();
        controller.complete(ticket, Err(NewsError::HttpStatus(503)));
        assert!(controller.notice().is_some());

        clock.advance(Duration::seconds(2));
        controller.expire_notice(Duration::seconds(4));
        assert!(controller.notice().is_some());

        clock.advance(Duration::seconds(2));
        controller.expire_notice(Duration::seconds(4));
        assert!(controller.notice().is_none());
    }

    #[test]
    fn test_dismiss_notice() {
        let mut controller = ready_controller(20, 20);
        let ticket = controller.begin_load_more().unwrap();
        controller.complete(ticket, Err(NewsError::HttpStatus(500)));

        assert!(controller
            .notice()
            .is_some_and(|n| n.message.contains("Couldn't load more")));
        controller.dismiss_notice();
        assert!(controller.notice().is_none());
    }

    #[test]
    fn test_last_updated_tracks_first_page_capture() {
        let (mut controller, _cache, clock) = create_controller(20);
        let start = clock.now();

        let ticket = controller.begin_activate().unwrap();
        controller.complete(ticket, Ok(articles(0..20)));
        assert_eq!(controller.last_updated(), Some(start));

        clock.advance(Duration::minutes(3));
        let ticket = controller.begin_load_more().unwrap();
        controller.complete(ticket, Ok(articles(20..40)));
        assert_eq!(controller.last_updated(), Some(start), "Later pages don't count");
    }

    #[test]
    fn test_near_end_threshold() {
        // 10 visible rows, half a screen: trigger with 5 or fewer rows left
        assert!(!near_end(0, 20, 10, 0.5));
        assert!(!near_end(13, 20, 10, 0.5));
        assert!(near_end(14, 20, 10, 0.5));
        assert!(near_end(19, 20, 10, 0.5));
    }

    #[test]
    fn test_near_end_empty_list() {
        assert!(!near_end(0, 0, 10, 0.5));
    }

    #[test]
    fn test_near_end_zero_rows_still_triggers_at_last_item() {
        assert!(near_end(4, 5, 0, 0.5));
        assert!(!near_end(3, 5, 0, 0.5));
    }
}
