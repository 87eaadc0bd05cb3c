//! Admission control for the fetch executor
//!
//! The scheduler owns all politeness state and the per-key ordering of
//! waiting URLs. It is driven from a single admission loop, which is the
//! sole mutator of its state: a URL may be dispatched iff the global
//! in-flight count is below `max_threads`, its politeness key has no
//! request in flight, and the key's crawl delay has elapsed since the last
//! completed fetch.

use crate::config::FetcherPolicy;
use crate::state::PolitenessSlot;
use crate::url::PolitenessKey;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use url::Url;

/// Buffer added to computed waits so the key is definitely ready on wake.
const WAKE_BUFFER: Duration = Duration::from_millis(10);

/// A normalized, grouped, scored URL waiting for admission
#[derive(Debug, Clone)]
pub struct ScoredUrl {
    /// Position in the input batch; ties on score resolve by this
    pub index: usize,

    /// The normalized URL to fetch
    pub url: Url,

    /// The politeness key this URL is rate-limited under
    pub key: PolitenessKey,

    /// Fetch priority; higher is fetched sooner within its key
    pub score: f64,
}

/// Per-key queues plus politeness accounting
///
/// Within a key, URLs leave in strict score order (highest first, input
/// order as tiebreak). Across keys there is no ordering guarantee; URLs
/// are admitted wherever capacity allows.
pub struct Scheduler {
    policy: FetcherPolicy,
    queues: HashMap<PolitenessKey, VecDeque<ScoredUrl>>,
    key_order: Vec<PolitenessKey>,
    slots: HashMap<PolitenessKey, PolitenessSlot>,
    in_flight: usize,
    pending: usize,
}

impl Scheduler {
    /// Creates an empty scheduler for the given policy
    pub fn new(policy: FetcherPolicy) -> Self {
        Self {
            policy,
            queues: HashMap::new(),
            key_order: Vec::new(),
            slots: HashMap::new(),
            in_flight: 0,
            pending: 0,
        }
    }

    /// Loads a batch of scored URLs
    ///
    /// Entries are sorted by descending score with a stable sort, so equal
    /// scores keep their input order, then distributed into per-key queues.
    pub fn load(&mut self, mut entries: Vec<ScoredUrl>) {
        entries.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for entry in entries {
            let queue = self.queues.entry(entry.key.clone()).or_insert_with(|| {
                self.key_order.push(entry.key.clone());
                VecDeque::new()
            });
            queue.push_back(entry);
            self.pending += 1;
        }
    }

    /// Pops every URL that may be dispatched right now
    ///
    /// At most one URL per key can come back (its slot is in flight
    /// afterwards), and never more than the remaining global capacity.
    pub fn admit(&mut self, now: Instant) -> Vec<ScoredUrl> {
        let mut admitted = Vec::new();

        for key in &self.key_order {
            if self.in_flight >= self.policy.max_threads as usize {
                break;
            }

            let queue = match self.queues.get_mut(key) {
                Some(queue) if !queue.is_empty() => queue,
                _ => continue,
            };

            let slot = self.slots.entry(key.clone()).or_default();
            if !slot.can_dispatch(&self.policy, now) {
                continue;
            }

            let entry = match queue.pop_front() {
                Some(entry) => entry,
                None => continue,
            };

            tracing::debug!(
                "Admitting {} (key={}, score={:.3}, in_flight={})",
                entry.url,
                entry.key,
                entry.score,
                self.in_flight + 1
            );

            slot.mark_dispatched();
            self.in_flight += 1;
            self.pending -= 1;
            admitted.push(entry);
        }

        admitted
    }

    /// Records that the in-flight fetch for a key finished
    ///
    /// Updates the slot's completion timestamp regardless of fetch outcome;
    /// the next crawl-delay window starts here.
    pub fn complete(&mut self, key: &str, now: Instant) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.mark_completed(now);
        }
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Minimum time until some waiting key becomes dispatchable on time
    /// grounds
    ///
    /// Considers only keys blocked by their crawl delay; keys blocked by an
    /// in-flight request (or by global capacity) become ready on a
    /// completion event instead, so they contribute no wait here. `None`
    /// means there is nothing to wait for on the clock.
    pub fn next_ready_in(&self, now: Instant) -> Option<Duration> {
        let mut min_wait: Option<Duration> = None;

        for key in &self.key_order {
            match self.queues.get(key) {
                Some(queue) if !queue.is_empty() => {}
                _ => continue,
            }

            let wait = match self.slots.get(key) {
                Some(slot) => match slot.time_until_ready(&self.policy, now) {
                    Some(wait) if !wait.is_zero() => wait,
                    // Ready now (blocked on capacity) or in flight
                    _ => continue,
                },
                // Never-seen key is ready immediately
                None => continue,
            };

            min_wait = Some(match min_wait {
                Some(current) if current <= wait => current,
                _ => wait,
            });
        }

        min_wait.map(|wait| wait + WAKE_BUFFER)
    }

    /// Removes and returns every URL still waiting for admission
    ///
    /// Used on cancellation; in-flight fetches are unaffected.
    pub fn drain_pending(&mut self) -> Vec<ScoredUrl> {
        let mut drained = Vec::new();
        for key in &self.key_order {
            if let Some(queue) = self.queues.get_mut(key) {
                drained.extend(queue.drain(..));
            }
        }
        self.pending = 0;
        drained
    }

    /// Number of URLs still waiting for admission
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Number of fetches currently in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// True once nothing is waiting and nothing is in flight
    pub fn is_drained(&self) -> bool {
        self.pending == 0 && self.in_flight == 0
    }
}
