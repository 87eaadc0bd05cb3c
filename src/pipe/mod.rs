//! The crawl fetch pipeline
//!
//! This module contains the concurrent fetch executor, including:
//! - Datum types flowing through the pipeline
//! - HTTP fetching with redirect handling and transparent retry
//! - Admission control and per-key rate limiting
//! - Overall run orchestration and cancellation

mod datum;
mod fetcher;
mod pipeline;
mod scheduler;

pub use datum::{FetchErrorKind, FetchedDatum, UrlDatum};
pub use fetcher::{build_http_client, HttpFetcher};
pub use pipeline::{CancelHandle, FetchPipe};
pub use scheduler::{Scheduler, ScoredUrl};
