//! Cache module for holding the most recent feed snapshot in memory
//!
//! This module provides a TTL cache with lazy eviction and an injectable clock.
//! Stale entries stay readable through a fallback read, allowing the application
//! to show old articles when the news API is unavailable.

mod clock;
mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::{CachedData, TtlCache};
