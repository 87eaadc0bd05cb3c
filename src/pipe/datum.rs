use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// A candidate URL entering the pipeline
///
/// Produced by the (external) URL ingestion layer. The optional
/// `last_fetch_time` feeds the score generator; `metadata` is opaque
/// caller-owned annotation and never inspected here. Results come back in
/// input order, so callers correlate outputs with their metadata by index.
#[derive(Debug, Clone)]
pub struct UrlDatum {
    /// The raw URL string; normalized on entry to the pipeline
    pub url: String,

    /// Opaque caller-owned annotations
    pub metadata: HashMap<String, String>,

    /// When this URL was last successfully fetched, if ever
    pub last_fetch_time: Option<DateTime<Utc>>,
}

impl UrlDatum {
    /// Creates a datum for a never-fetched URL with no metadata
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            metadata: HashMap::new(),
            last_fetch_time: None,
        }
    }

    /// Sets the last successful fetch time
    pub fn with_last_fetch_time(mut self, time: DateTime<Utc>) -> Self {
        self.last_fetch_time = Some(time);
        self
    }

    /// Adds a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Why a fetch attempt produced no usable response
///
/// Recorded on the emitted [`FetchedDatum`]; never raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The input could not be parsed as an http(s) URL with a host
    MalformedUrl,

    /// The host has no determinable registrable domain
    UnresolvableHost,

    /// DNS failure, connection refused/reset, TLS failure; retried once
    /// transparently before being recorded
    ConnectionError,

    /// The request exceeded the policy's fetch timeout
    Timeout,

    /// The redirect chain exceeded the policy's hop limit
    TooManyRedirects,

    /// The run was cancelled before this URL was dispatched
    Cancelled,
}

impl FetchErrorKind {
    /// Stable string form, suitable for result records consumed downstream
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedUrl => "malformed_url",
            Self::UnresolvableHost => "unresolvable_host",
            Self::ConnectionError => "connection_error",
            Self::Timeout => "timeout",
            Self::TooManyRedirects => "too_many_redirects",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the stable string form; `None` for unknown strings
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "malformed_url" => Some(Self::MalformedUrl),
            "unresolvable_host" => Some(Self::UnresolvableHost),
            "connection_error" => Some(Self::ConnectionError),
            "timeout" => Some(Self::Timeout),
            "too_many_redirects" => Some(Self::TooManyRedirects),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns all error kinds
    pub fn all_kinds() -> Vec<Self> {
        vec![
            Self::MalformedUrl,
            Self::UnresolvableHost,
            Self::ConnectionError,
            Self::Timeout,
            Self::TooManyRedirects,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The result record emitted for one input URL
///
/// Exactly one `FetchedDatum` is produced per input [`UrlDatum`]; failures
/// still produce a record with `error` set and no status/content. The
/// record carries enough to recompute `last_fetch_time` for the next crawl
/// round (`fetch_time` plus [`FetchedDatum::is_success`]).
#[derive(Debug, Clone)]
pub struct FetchedDatum {
    /// The URL this record answers for (normalized form where
    /// normalization succeeded, the raw input otherwise)
    pub url: String,

    /// Terminal URL when redirects moved the fetch elsewhere
    pub new_base_url: Option<String>,

    /// HTTP status of the final response; `None` for network-level failures
    pub http_status: Option<u16>,

    /// Response headers of the final response
    pub headers: HashMap<String, String>,

    /// Response body; empty on failure
    pub content: Vec<u8>,

    /// When the fetch attempt finished
    pub fetch_time: DateTime<Utc>,

    /// Set when the attempt produced no usable response
    pub error: Option<FetchErrorKind>,
}

impl FetchedDatum {
    /// Creates a success record from a final HTTP response
    pub fn success(
        url: String,
        http_status: u16,
        headers: HashMap<String, String>,
        content: Vec<u8>,
        new_base_url: Option<String>,
    ) -> Self {
        Self {
            url,
            new_base_url,
            http_status: Some(http_status),
            headers,
            content,
            fetch_time: Utc::now(),
            error: None,
        }
    }

    /// Creates a failure record carrying only the error kind
    pub fn failure(url: String, error: FetchErrorKind) -> Self {
        Self {
            url,
            new_base_url: None,
            http_status: None,
            headers: HashMap::new(),
            content: Vec::new(),
            fetch_time: Utc::now(),
            error: Some(error),
        }
    }

    /// Whether the fetch produced an HTTP response (of any status)
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The response's Content-Type header, if present
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_datum_builders() {
        let t = Utc::now();
        let datum = UrlDatum::new("https://example.com/")
            .with_last_fetch_time(t)
            .with_metadata("source", "sitemap");

        assert_eq!(datum.url, "https://example.com/");
        assert_eq!(datum.last_fetch_time, Some(t));
        assert_eq!(datum.metadata.get("source").unwrap(), "sitemap");
    }

    #[test]
    fn test_failure_record_shape() {
        let datum = FetchedDatum::failure("bad".to_string(), FetchErrorKind::MalformedUrl);
        assert!(!datum.is_success());
        assert_eq!(datum.http_status, None);
        assert!(datum.content.is_empty());
        assert!(datum.headers.is_empty());
        assert_eq!(datum.error, Some(FetchErrorKind::MalformedUrl));
    }

    #[test]
    fn test_success_record_shape() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());

        let datum = FetchedDatum::success(
            "https://example.com/".to_string(),
            200,
            headers,
            b"<html></html>".to_vec(),
            None,
        );

        assert!(datum.is_success());
        assert_eq!(datum.http_status, Some(200));
        assert_eq!(datum.content_type(), Some("text/html"));
        assert!(datum.error.is_none());
    }

    #[test]
    fn test_non_2xx_is_still_a_response() {
        let datum = FetchedDatum::success(
            "https://example.com/missing".to_string(),
            404,
            HashMap::new(),
            Vec::new(),
            None,
        );
        assert!(datum.is_success());
        assert_eq!(datum.http_status, Some(404));
    }

    #[test]
    fn test_error_kind_string_roundtrip() {
        for kind in FetchErrorKind::all_kinds() {
            let parsed = FetchErrorKind::parse(kind.as_str());
            assert_eq!(Some(kind), parsed, "Failed roundtrip for {:?}", kind);
        }
        assert_eq!(FetchErrorKind::parse("invalid"), None);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(format!("{}", FetchErrorKind::Timeout), "timeout");
        assert_eq!(
            format!("{}", FetchErrorKind::TooManyRedirects),
            "too_many_redirects"
        );
    }
}
