//! URL handling
//!
//! This module provides URL normalization and politeness-key (pay-level
//! domain) grouping. Both are pure functions of the URL: normalization
//! makes semantically identical URLs comparable, grouping decides which
//! rate-limit bucket a URL belongs to.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{politeness_key, PolitenessKey};
pub use normalize::normalize_url;
