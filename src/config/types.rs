use serde::Deserialize;
use std::time::Duration;

/// Default staleness threshold: ten days, after which a previously fetched
/// URL scores the same as a never-fetched one.
pub const DEFAULT_STALE_AFTER_MILLIS: u64 = 1000 * 60 * 60 * 24 * 10;

/// Default bound on redirect hops followed per fetch.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Top-level policy file structure
///
/// The policy lives under a `[fetcher]` section so the file can be shared
/// with the surrounding crawl driver's configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyFile {
    pub fetcher: FetcherPolicy,
}

/// Immutable fetch limits for a pipeline run
///
/// Shared read-only by every fetch worker; validated eagerly at load time
/// so out-of-range values are rejected before the first fetch, not at first
/// use.
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherPolicy {
    /// Maximum number of concurrent fetches across all politeness keys
    #[serde(rename = "max-threads")]
    pub max_threads: u32,

    /// Minimum time between completed fetches to the same politeness key
    /// (milliseconds)
    #[serde(rename = "crawl-delay-millis")]
    pub crawl_delay_millis: u64,

    /// Total per-request timeout (milliseconds)
    #[serde(rename = "fetch-timeout-millis")]
    pub fetch_timeout_millis: u64,

    /// Identification string sent to remote servers
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Age beyond which a previously fetched URL is considered fully stale
    /// (milliseconds)
    #[serde(rename = "stale-after-millis", default = "default_stale_after")]
    pub stale_after_millis: u64,

    /// Maximum redirect hops to follow before failing the fetch
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: u32,
}

fn default_stale_after() -> u64 {
    DEFAULT_STALE_AFTER_MILLIS
}

fn default_max_redirects() -> u32 {
    DEFAULT_MAX_REDIRECTS
}

impl FetcherPolicy {
    /// Creates a policy with the given limits and default staleness/redirect
    /// settings
    ///
    /// Useful when the policy is constructed in code rather than loaded from
    /// a file. The result still needs [`crate::config::validate`] before use;
    /// [`crate::pipe::FetchPipe::new`] runs that check itself.
    pub fn new(
        max_threads: u32,
        crawl_delay_millis: u64,
        fetch_timeout_millis: u64,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            max_threads,
            crawl_delay_millis,
            fetch_timeout_millis,
            user_agent: user_agent.into(),
            stale_after_millis: DEFAULT_STALE_AFTER_MILLIS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    /// The per-key crawl delay as a [`Duration`]
    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_millis)
    }

    /// The per-request timeout as a [`Duration`]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_millis)
    }

    /// The staleness threshold as a [`chrono::Duration`] for score math
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.stale_after_millis as i64)
    }
}
