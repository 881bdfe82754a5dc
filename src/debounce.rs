//! Trailing-edge debounce filter
//!
//! A single minimum-interval threshold against the last delivered event.
//! Bounces are dropped, never merged or replayed, and ordering is preserved.

use std::time::Duration;

use crate::types::EventTimestamp;

/// Debounce filter over kernel event timestamps
///
/// The check is split from the commit so that only events the caller actually
/// delivered advance the window: an edge that clears the window but is
/// filtered out for its direction must not suppress the next one.
#[derive(Debug)]
pub struct DebounceFilter {
    window: Duration,
    last_accepted: Option<u64>,
}

impl DebounceFilter {
    /// Create a filter with the given minimum interval
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Whether this event falls inside the bounce window of the last
    /// accepted one
    ///
    /// An event exactly one window after the last accepted event is not a
    /// bounce. A timestamp earlier than the last accepted one is treated as
    /// a bounce so out-of-order stamps are never delivered.
    pub fn is_bounce(&self, timestamp: EventTimestamp) -> bool {
        match self.last_accepted {
            None => false,
            Some(last) => {
                (timestamp.as_nanos().saturating_sub(last) as u128) < self.window.as_nanos()
            }
        }
    }

    /// Record a delivered event as the new window origin
    pub fn mark_accepted(&mut self, timestamp: EventTimestamp) {
        self.last_accepted = Some(timestamp.as_nanos());
    }
}
