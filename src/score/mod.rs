//! Priority scoring for fetch ordering
//!
//! Scores order fetch attempts within and across politeness groups; they
//! are never used for admission control. Higher score means fetch sooner.

use chrono::{DateTime, Duration, Utc};

use crate::config::FetcherPolicy;

/// Highest priority: a URL we have never fetched, or one fully stale.
pub const MAX_SCORE: f64 = 1.0;

/// Lowest priority: a URL fetched just now.
pub const MIN_SCORE: f64 = 0.0;

/// Assigns a numeric priority to a URL given its last-fetch time
///
/// Implementations must be pure: identical inputs always yield the same
/// score, and scoring has no side effects. Ties are broken by original
/// input order in the orchestrator, so equal scores are safe.
pub trait ScoreGenerator: Send + Sync {
    /// Scores a URL; `last_fetch` is `None` for never-fetched URLs.
    fn score(&self, last_fetch: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64;
}

/// Score generator based on time since the last successful fetch
///
/// Never-fetched URLs get [`MAX_SCORE`]. Previously fetched URLs score by
/// how much of the staleness window has elapsed, decaying linearly from
/// [`MAX_SCORE`] at the threshold down to [`MIN_SCORE`] for a fetch
/// completed just now. The linear curve is a policy choice; only the
/// ordering it induces matters.
#[derive(Debug, Clone)]
pub struct LastFetchScoreGenerator {
    stale_after: Duration,
}

impl LastFetchScoreGenerator {
    /// Creates a generator with the given staleness threshold
    pub fn new(stale_after: Duration) -> Self {
        Self { stale_after }
    }

    /// Creates a generator from the policy's staleness threshold
    pub fn from_policy(policy: &FetcherPolicy) -> Self {
        Self::new(policy.stale_after())
    }
}

impl ScoreGenerator for LastFetchScoreGenerator {
    fn score(&self, last_fetch: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let last = match last_fetch {
            None => return MAX_SCORE,
            Some(t) => t,
        };

        let age = now - last;
        if age <= Duration::zero() {
            // Clock skew: a last-fetch timestamp in the future counts as fresh
            return MIN_SCORE;
        }
        if age >= self.stale_after {
            return MAX_SCORE;
        }

        let ratio = age.num_milliseconds() as f64 / self.stale_after.num_milliseconds() as f64;
        ratio.clamp(MIN_SCORE, MAX_SCORE)
    }
}
