//! Background fetch dispatch
//!
//! Runs feed fetches as tokio tasks and delivers their results to the UI loop
//! over a channel, so the screen keeps redrawing while requests are in flight.
//! In-flight fetches are aborted when the dispatcher shuts down or is dropped.

use std::sync::Arc;

use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::data::{Article, NewsError};
use crate::feed::{FeedSource, FetchTicket};

/// A finished fetch, ready to hand to the controller
#[derive(Debug)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<Vec<Article>, NewsError>,
}

/// Spawns fetches against a feed source and collects their outcomes
pub struct FetchDispatcher {
    source: Arc<dyn FeedSource>,
    sender: mpsc::Sender<FetchOutcome>,
    receiver: mpsc::Receiver<FetchOutcome>,
    in_flight: Vec<JoinHandle<()>>,
}

impl FetchDispatcher {
    /// Creates a dispatcher. Must be used inside a tokio runtime.
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        Self {
            source,
            sender,
            receiver,
            in_flight: Vec::new(),
        }
    }

    /// Starts the fetch described by `ticket` in the background
    pub fn dispatch(&mut self, ticket: FetchTicket) {
        self.in_flight.retain(|handle| !handle.is_finished());

        let source = Arc::clone(&self.source);
        let tx = self.sender.clone();
        debug!("dispatching {:?} fetch for page {}", ticket.kind, ticket.page);

        let handle = tokio::spawn(async move {
            let result = ticket.fetch(source.as_ref()).await;
            let _ = tx.send(FetchOutcome { ticket, result }).await;
        });
        self.in_flight.push(handle);
    }

    /// Checks for a finished fetch without blocking
    pub fn try_recv(&mut self) -> Option<FetchOutcome> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the next finished fetch
    ///
    /// Only returns once something completes; do not call with nothing in
    /// flight.
    pub async fn recv(&mut self) -> Option<FetchOutcome> {
        self.receiver.recv().await
    }

    /// Number of fetches that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Aborts every in-flight fetch
    pub fn shutdown(&mut self) {
        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for FetchDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
