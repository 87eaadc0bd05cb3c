//! Fetch pipeline orchestrator
//!
//! Composes normalization, grouping, scoring, admission control, and the
//! concurrent fetch executor. The orchestrator runs a single-threaded
//! admission loop that is the sole mutator of politeness state; workers
//! suspend only inside network I/O and report back over a channel, so all
//! cross-worker coordination funnels through one decision point.

use crate::config::{validate, FetcherPolicy};
use crate::pipe::datum::{FetchErrorKind, FetchedDatum, UrlDatum};
use crate::pipe::fetcher::HttpFetcher;
use crate::pipe::scheduler::{Scheduler, ScoredUrl};
use crate::score::{LastFetchScoreGenerator, ScoreGenerator};
use crate::url::{normalize_url, politeness_key, PolitenessKey};
use crate::{PipelineError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

/// Fallback tick when no clock-based wait exists; completion events and
/// cancellation wake the loop earlier.
const IDLE_TICK: Duration = Duration::from_secs(30);

/// A finished fetch reported back to the admission loop
struct Completion {
    index: usize,
    key: PolitenessKey,
    datum: FetchedDatum,
}

/// Run-level cancellation signal
///
/// Cloneable across threads. On cancel, in-flight fetches finish (bounded
/// by their own timeout), no new fetches are admitted, and every
/// un-started URL is emitted with `errorKind = Cancelled`.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Requests cancellation of the current and any future run
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// The fetch pipeline
///
/// Immutable once constructed; [`FetchPipe::run`] takes a bounded batch of
/// URL records and returns exactly one [`FetchedDatum`] per input, in
/// input order. Per-URL failures are recorded on the datum; only
/// run-fatal problems surface as errors.
pub struct FetchPipe {
    policy: FetcherPolicy,
    fetcher: Arc<HttpFetcher>,
    scorer: Arc<dyn ScoreGenerator>,
    cancel: Arc<watch::Sender<bool>>,
}

impl FetchPipe {
    /// Creates a pipeline with the default last-fetch score generator
    ///
    /// The policy is validated eagerly; an invalid policy is a fatal error.
    pub fn new(policy: FetcherPolicy) -> Result<Self> {
        let scorer = Arc::new(LastFetchScoreGenerator::from_policy(&policy));
        Self::with_scorer(policy, scorer)
    }

    /// Creates a pipeline with a caller-provided score generator
    pub fn with_scorer(policy: FetcherPolicy, scorer: Arc<dyn ScoreGenerator>) -> Result<Self> {
        validate(&policy)?;
        let fetcher = Arc::new(HttpFetcher::new(policy.clone())?);
        let (cancel, _) = watch::channel(false);

        Ok(Self {
            policy,
            fetcher,
            scorer,
            cancel: Arc::new(cancel),
        })
    }

    /// Returns a handle that cancels this pipeline's runs
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel),
        }
    }

    /// Fetches a batch, emitting one result record per input URL
    ///
    /// The batch completes only when every input has a result. Ordering of
    /// fetches follows scores within each politeness key; the returned
    /// vector is in input order.
    pub async fn run(&self, input: Vec<UrlDatum>) -> Result<Vec<FetchedDatum>> {
        let total = input.len();
        tracing::info!("Starting fetch run with {} URLs", total);
        let start_time = Instant::now();

        let mut outputs: Vec<Option<FetchedDatum>> = (0..total).map(|_| None).collect();
        let mut scheduler = Scheduler::new(self.policy.clone());
        scheduler.load(self.prepare(input, &mut outputs));

        let (tx, mut rx) = mpsc::channel::<Completion>(self.policy.max_threads as usize);
        let mut cancel_rx = self.cancel.subscribe();
        let mut cancelled = *cancel_rx.borrow();

        loop {
            if cancelled {
                for entry in scheduler.drain_pending() {
                    outputs[entry.index] = Some(FetchedDatum::failure(
                        entry.url.to_string(),
                        FetchErrorKind::Cancelled,
                    ));
                }
            } else {
                for entry in scheduler.admit(Instant::now()) {
                    self.dispatch(entry, tx.clone());
                }
            }

            if scheduler.is_drained() {
                break;
            }

            let wait = scheduler
                .next_ready_in(Instant::now())
                .unwrap_or(IDLE_TICK);

            tokio::select! {
                maybe = rx.recv(), if scheduler.in_flight() > 0 => {
                    if let Some(done) = maybe {
                        scheduler.complete(&done.key, Instant::now());
                        tracing::trace!(
                            "Completed {} (key={}, error={:?})",
                            done.datum.url,
                            done.key,
                            done.datum.error
                        );
                        outputs[done.index] = Some(done.datum);
                    }
                }
                _ = tokio::time::sleep(wait) => {}
                changed = cancel_rx.changed(), if !cancelled => {
                    if changed.is_ok() && *cancel_rx.borrow() {
                        cancelled = true;
                        tracing::info!(
                            "Cancellation requested: {} in flight, {} un-started",
                            scheduler.in_flight(),
                            scheduler.pending()
                        );
                    }
                }
            }
        }

        let results: Vec<FetchedDatum> = outputs
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(PipelineError::MissingResult { index }))
            .collect::<Result<_>>()?;

        let failures = results.iter().filter(|d| !d.is_success()).count();
        tracing::info!(
            "Fetch run complete: {} URLs, {} failures, {:?} elapsed",
            total,
            failures,
            start_time.elapsed()
        );

        Ok(results)
    }

    /// Normalizes, groups, and scores the batch
    ///
    /// URLs that fail normalization or grouping go straight to the output
    /// with their error kind recorded; they never block the batch and
    /// never touch the network.
    fn prepare(
        &self,
        input: Vec<UrlDatum>,
        outputs: &mut [Option<FetchedDatum>],
    ) -> Vec<ScoredUrl> {
        let now = Utc::now();
        let mut ready = Vec::with_capacity(input.len());

        for (index, datum) in input.into_iter().enumerate() {
            let url = match normalize_url(&datum.url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Rejecting malformed URL {:?}: {}", datum.url, e);
                    outputs[index] = Some(FetchedDatum::failure(
                        datum.url,
                        FetchErrorKind::MalformedUrl,
                    ));
                    continue;
                }
            };

            let key = match politeness_key(&url) {
                Ok(key) => key,
                Err(e) => {
                    tracing::debug!("No politeness key for {}: {}", url, e);
                    outputs[index] = Some(FetchedDatum::failure(
                        url.to_string(),
                        FetchErrorKind::UnresolvableHost,
                    ));
                    continue;
                }
            };

            let score = self.scorer.score(datum.last_fetch_time, now);
            ready.push(ScoredUrl {
                index,
                url,
                key,
                score,
            });
        }

        ready
    }

    /// Hands an admitted URL to a fetch worker
    fn dispatch(&self, entry: ScoredUrl, tx: mpsc::Sender<Completion>) {
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(async move {
            let datum = fetcher.fetch(&entry.url).await;
            // The receiver outlives all workers; a send failure means the
            // run already aborted fatally.
            let _ = tx
                .send(Completion {
                    index: entry.index,
                    key: entry.key,
                    datum,
                })
                .await;
        });
    }
}
