//! Application state management for the headlines reader
//!
//! This module contains the main application state, handling keyboard input,
//! handing fetches to the background dispatcher, and state transitions between
//! the list and detail views.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use log::debug;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::data::Article;
use crate::feed::{near_end, FeedConfig, FeedController, FeedPhase, FeedSource};
use crate::fetch::{FetchDispatcher, FetchOutcome};

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while the first page is fetched
    Loading,
    /// List view showing all loaded articles
    ArticleList,
    /// Detail view for the article at this index
    ArticleDetail(usize),
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Index of currently selected article in list view
    pub selected_index: usize,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Scroll offset for article detail view
    pub detail_scroll_offset: u16,
    /// Article rows that fit in the list view, kept up to date by the main loop
    pub visible_rows: usize,
    /// Feed state: articles, pagination, loading flags and errors
    pub feed: FeedController,
    config: FeedConfig,
    notice_max_age: chrono::Duration,
    fetcher: FetchDispatcher,
}

impl App {
    /// Creates a new App instance. Must be called inside a tokio runtime.
    pub fn new(
        config: FeedConfig,
        cache: Arc<TtlCache<Vec<Article>>>,
        source: Arc<dyn FeedSource>,
    ) -> Self {
        Self::with_clock(config, cache, source, Arc::new(SystemClock))
    }

    /// Creates a new App instance with an injected clock
    pub fn with_clock(
        config: FeedConfig,
        cache: Arc<TtlCache<Vec<Article>>>,
        source: Arc<dyn FeedSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let notice_max_age = chrono::Duration::from_std(config.notice_duration)
            .unwrap_or_else(|_| chrono::Duration::seconds(4));

        Self {
            state: AppState::Loading,
            selected_index: 0,
            should_quit: false,
            show_help: false,
            detail_scroll_offset: 0,
            visible_rows: 10,
            feed: FeedController::with_clock(cache, config.page_size, clock),
            config,
            notice_max_age,
            fetcher: FetchDispatcher::new(source),
        }
    }

    /// Activates the feed, serving from cache or starting the first fetch
    pub fn start(&mut self) {
        if let Some(ticket) = self.feed.begin_activate() {
            self.fetcher.dispatch(ticket);
        }
        self.sync_state();
    }

    /// Applies every finished fetch and expires old notices
    ///
    /// # Returns
    /// `true` if any fetch result was applied
    pub fn poll_fetches(&mut self) -> bool {
        let mut applied = false;
        while let Some(outcome) = self.fetcher.try_recv() {
            self.apply(outcome);
            applied = true;
        }
        self.feed.expire_notice(self.notice_max_age);
        applied
    }

    /// Waits for the next fetch to finish and applies it
    ///
    /// Only call with a fetch in flight.
    pub async fn wait_for_fetch(&mut self) {
        if let Some(outcome) = self.fetcher.recv().await {
            self.apply(outcome);
        }
    }

    /// Number of fetches still running
    pub fn in_flight(&self) -> usize {
        self.fetcher.in_flight()
    }

    /// Aborts all running fetches
    pub fn shutdown(&mut self) {
        self.fetcher.shutdown();
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Returns the total number of loaded articles
    pub fn article_count(&self) -> usize {
        self.feed.articles().len()
    }

    /// Returns the currently selected article, if any
    pub fn selected_article(&self) -> Option<&Article> {
        self.feed.articles().get(self.selected_index)
    }

    /// Starts a refresh unless one is already running
    pub fn request_refresh(&mut self) {
        if let Some(ticket) = self.feed.begin_refresh() {
            self.fetcher.dispatch(ticket);
        }
    }

    /// Requests the next page once the selection nears the end of the list
    pub fn maybe_load_more(&mut self) {
        if !near_end(
            self.selected_index,
            self.article_count(),
            self.visible_rows,
            self.config.load_more_threshold,
        ) {
            return;
        }
        if let Some(ticket) = self.feed.begin_load_more() {
            self.fetcher.dispatch(ticket);
        }
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Arguments
    /// * `key_event` - The keyboard event to handle
    ///
    /// # Key Bindings
    /// - `q`: Quit the application
    /// - `Esc` (in ArticleList): Quit the application
    /// - `Up`/`k`, `Down`/`j`: Move selection (list) or scroll (detail)
    /// - `g`/`G`: Jump to top/bottom
    /// - `Enter`: Open the selected article
    /// - `r`: Refresh the feed
    /// - `x`: Dismiss the current notification
    /// - `Esc` (in ArticleDetail): Go back to list view
    /// - `?`: Toggle help
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {} // Ignore other keys when help is shown
            }
            return;
        }

        match self.state {
            AppState::Loading => {
                // Only quit is allowed during loading
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::ArticleList => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_selection_up();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_selection_down();
                    self.maybe_load_more();
                }
                KeyCode::Char('g') => {
                    self.selected_index = 0;
                }
                KeyCode::Char('G') => {
                    self.selected_index = self.article_count().saturating_sub(1);
                    self.maybe_load_more();
                }
                KeyCode::Enter => {
                    if self.selected_article().is_some() {
                        self.state = AppState::ArticleDetail(self.selected_index);
                    }
                }
                KeyCode::Char('r') => {
                    self.request_refresh();
                }
                KeyCode::Char('x') => {
                    self.feed.dismiss_notice();
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::ArticleDetail(_) => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc | KeyCode::Backspace => {
                    self.detail_scroll_offset = 0;
                    self.state = AppState::ArticleList;
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    self.detail_scroll_offset = self.detail_scroll_offset.saturating_add(1);
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.detail_scroll_offset = self.detail_scroll_offset.saturating_sub(1);
                }
                KeyCode::Char('g') => {
                    self.detail_scroll_offset = 0;
                }
                KeyCode::Char('x') => {
                    self.feed.dismiss_notice();
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
        }
    }

    fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.article_count() {
            self.selected_index += 1;
        }
    }

    fn apply(&mut self, outcome: FetchOutcome) {
        debug!(
            "applying {:?} result for page {}",
            outcome.ticket.kind, outcome.ticket.page
        );
        let open_url = self.open_article_url();
        self.feed.complete(outcome.ticket, outcome.result);
        self.sync_state();
        self.follow_open_article(open_url);
        self.clamp_selection();
    }

    fn open_article_url(&self) -> Option<String> {
        match self.state {
            AppState::ArticleDetail(index) => {
                self.feed.articles().get(index).map(|a| a.url.clone())
            }
            _ => None,
        }
    }

    /// Keeps the detail view on the same article after the list is replaced
    ///
    /// Returns to the list if the article is no longer there.
    fn follow_open_article(&mut self, open_url: Option<String>) {
        let AppState::ArticleDetail(index) = self.state else {
            return;
        };
        let Some(url) = open_url else {
            return;
        };
        let articles = self.feed.articles();
        if articles.get(index).is_some_and(|a| a.url == url) {
            return;
        }

        match articles.iter().position(|a| a.url == url) {
            Some(position) => {
                self.selected_index = position;
                self.state = AppState::ArticleDetail(position);
            }
            None => {
                self.detail_scroll_offset = 0;
                self.state = AppState::ArticleList;
            }
        }
    }

    /// Leaves the loading screen once the initial load has settled
    fn sync_state(&mut self) {
        if self.state == AppState::Loading
            && matches!(self.feed.phase(), FeedPhase::Ready | FeedPhase::Degraded)
        {
            self.state = AppState::ArticleList;
        }
    }

    /// Keeps the selection and open article inside the list after it shrinks
    fn clamp_selection(&mut self) {
        let count = self.article_count();
        self.selected_index = self.selected_index.min(count.saturating_sub(1));

        if let AppState::ArticleDetail(index) = self.state {
            if index >= count {
                self.detail_scroll_offset = 0;
                self.state = AppState::ArticleList;
            }
        }
    }
}
