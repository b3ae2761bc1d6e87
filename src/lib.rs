//! Headlines Library
//!
//! Exposes the cache, feed controller, news client and TUI pieces so the
//! binary and the integration tests share one implementation.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod feed;
pub mod fetch;
pub mod logging;
pub mod ui;
