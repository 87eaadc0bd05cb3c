//! Fetchpipe: the fetch core of a distributed web crawler
//!
//! Given a bounded batch of candidate URLs, this crate normalizes them,
//! groups them by pay-level domain for politeness, orders them by staleness
//! score, and drives a concurrent fetch executor that emits exactly one
//! result record per input URL.

pub mod config;
pub mod pipe;
pub mod score;
pub mod state;
pub mod url;

use thiserror::Error;

/// Fatal, run-aborting errors
///
/// Per-URL failures never surface here; they are recorded on the emitted
/// [`pipe::FetchedDatum`] instead. A `PipelineError` means the pipeline
/// cannot make progress for any URL.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Policy error: {0}")]
    Policy(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("No result produced for input {index}")]
    MissingResult { index: usize },
}

/// Policy/configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("No registrable domain for host: {0}")]
    UnresolvableHost(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for policy operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::FetcherPolicy;
pub use pipe::{CancelHandle, FetchErrorKind, FetchPipe, FetchedDatum, HttpFetcher, UrlDatum};
pub use score::{LastFetchScoreGenerator, ScoreGenerator};
pub use crate::url::{normalize_url, politeness_key, PolitenessKey};
