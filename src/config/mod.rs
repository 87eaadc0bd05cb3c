//! Fetcher policy configuration
//!
//! This module handles loading, parsing, and validating the TOML fetcher
//! policy that bounds a pipeline run.
//!
//! # Example
//!
//! ```no_run
//! use fetchpipe::config::load_policy;
//! use std::path::Path;
//!
//! let policy = load_policy(Path::new("fetcher.toml")).unwrap();
//! println!("Crawl delay: {}ms", policy.crawl_delay_millis);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{FetcherPolicy, PolicyFile, DEFAULT_MAX_REDIRECTS, DEFAULT_STALE_AFTER_MILLIS};

// Re-export parser functions
pub use parser::{compute_policy_hash, load_policy, load_policy_with_hash};

// Re-export validation
pub use validation::validate;
