use crate::config::FetcherPolicy;
use std::time::{Duration, Instant};

/// Per-politeness-key fetch accounting
///
/// Tracks whether a request to the key is currently in flight and when the
/// last one completed. Slots are created lazily on first sight of a key,
/// live for the duration of the run, and are never persisted.
///
/// A slot is owned exclusively by the admission loop; workers never touch
/// it directly. Combined with the admission rules this guarantees at most
/// one in-flight request per key, spaced by at least the policy's crawl
/// delay.
#[derive(Debug, Clone, Default)]
pub struct PolitenessSlot {
    /// Whether a request to this key is currently in flight
    pub in_flight: bool,

    /// When the last request to this key completed (success or failure)
    pub last_completed: Option<Instant>,
}

impl PolitenessSlot {
    /// Creates a fresh slot with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether a request to this key may be dispatched now
    ///
    /// Requires both that no request is in flight and that the crawl delay
    /// has elapsed since the last completed request.
    pub fn can_dispatch(&self, policy: &FetcherPolicy, now: Instant) -> bool {
        if self.in_flight {
            return false;
        }

        match self.last_completed {
            Some(last) => now.duration_since(last) >= policy.crawl_delay(),
            None => true,
        }
    }

    /// Time until this key becomes dispatchable on time grounds alone
    ///
    /// Returns `None` while a request is in flight: readiness then depends
    /// on a completion event, not on the clock. Otherwise returns the
    /// remaining crawl delay, or `Duration::ZERO` when the key is ready
    /// now.
    pub fn time_until_ready(&self, policy: &FetcherPolicy, now: Instant) -> Option<Duration> {
        if self.in_flight {
            return None;
        }

        let last = match self.last_completed {
            Some(last) => last,
            None => return Some(Duration::ZERO),
        };

        let elapsed = now.duration_since(last);
        let delay = policy.crawl_delay();
        if elapsed >= delay {
            Some(Duration::ZERO)
        } else {
            Some(delay - elapsed)
        }
    }

    /// Marks a request to this key as dispatched
    pub fn mark_dispatched(&mut self) {
        self.in_flight = true;
    }

    /// Marks the in-flight request as completed, regardless of outcome
    ///
    /// The completion timestamp starts the next crawl-delay window.
    pub fn mark_completed(&mut self, now: Instant) {
        self.in_flight = false;
        self.last_completed = Some(now);
    }
}
