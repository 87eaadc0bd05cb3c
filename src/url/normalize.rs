use crate::UrlError;
use url::Url;

/// Normalizes a raw URL string into its canonical, comparable form
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or missing a host
/// 2. Require an http or https scheme
/// 3. Lowercase scheme and host (done by the parser)
/// 4. Strip the scheme's default port (done by the parser)
/// 5. Collapse `.`/`..` path segments (done by the parser)
/// 6. Remove the fragment
/// 7. Sort query parameters deterministically by key, then value;
///    duplicates are kept, an empty query string is dropped
///
/// Two semantically identical URLs normalize to the same string, and the
/// function is idempotent: normalizing an already-normalized URL is a
/// no-op.
///
/// # Examples
///
/// ```
/// use fetchpipe::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.COM:80/a/../b?z=1&a=2#frag").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b?a=2&z=1");
/// ```
pub fn normalize_url(raw: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    match url.query() {
        Some("") => url.set_query(None),
        Some(_) => sort_query_params(&mut url),
        None => {}
    }

    Ok(url)
}

/// Rewrites the query string with parameters in sorted order
///
/// Sorting is by key first, then value, so duplicate keys keep a stable
/// relative order regardless of how the input was written.
fn sort_query_params(url: &mut Url) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    pairs.sort();

    url.set_query(None);
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_scheme_and_host() {
        let result = normalize_url("HTTPS://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_strip_default_port_http() {
        let result = normalize_url("http://example.com:80/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_strip_default_port_https() {
        let result = normalize_url("https://example.com:443/page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keep_non_default_port() {
        let result = normalize_url("http://example.com:8080/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com:8080/page");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_collapse_dot_segments() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_sort_query_params() {
        let result = normalize_url("https://example.com/page?b=2&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?a=1&b=2");
    }

    #[test]
    fn test_duplicate_query_keys_kept() {
        let result = normalize_url("https://example.com/page?a=2&b=1&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?a=1&a=2&b=1");
    }

    #[test]
    fn test_empty_query_dropped() {
        let result = normalize_url("https://example.com/page?").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_query_order_irrelevant() {
        let a = normalize_url("https://example.com/p?x=1&y=2").unwrap();
        let b = normalize_url("https://example.com/p?y=2&x=1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "HTTP://Example.COM:80/a/../b?z=1&a=2#frag",
            "https://example.com/page?b=&a=1",
            "https://example.com",
            "http://127.0.0.1:8080/path?q=hello+world",
        ];

        for input in inputs {
            let once = normalize_url(input).unwrap();
            let twice = normalize_url(once.as_str()).unwrap();
            assert_eq!(once, twice, "Not idempotent for {}", input);
        }
    }

    #[test]
    fn test_deterministic() {
        let a = normalize_url("https://example.com/p?a=1&b=2").unwrap();
        let b = normalize_url("https://example.com/p?a=1&b=2").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/file");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        let result = normalize_url("not a url");
        assert!(matches!(result, Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_ip_host_preserved() {
        let result = normalize_url("http://192.168.1.1:8080/admin").unwrap();
        assert_eq!(result.as_str(), "http://192.168.1.1:8080/admin");
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let result = normalize_url("  https://example.com/page  ").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }
}
