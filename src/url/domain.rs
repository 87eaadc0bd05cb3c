use crate::UrlError;
use url::{Host, Url};

/// The registrable (pay-level) domain a URL belongs to, used as the unit of
/// rate limiting.
pub type PolitenessKey = String;

/// Derives the politeness key for a normalized URL
///
/// The key is the registrable domain of the host, resolved against the
/// embedded public-suffix rule set so multi-part suffixes group correctly
/// (`a.b.co.uk` groups as `b.co.uk`, not `co.uk`). All subdomains of the
/// same registrable domain share one key.
///
/// Bare IP hosts have no registrable domain; the IP string itself is the
/// key. Hosts for which no registrable domain can be determined (e.g.
/// `localhost`) fail with [`UrlError::UnresolvableHost`].
///
/// # Examples
///
/// ```
/// use fetchpipe::url::{normalize_url, politeness_key};
///
/// let url = normalize_url("https://deep.sub.example.co.uk/page").unwrap();
/// assert_eq!(politeness_key(&url).unwrap(), "example.co.uk");
/// ```
pub fn politeness_key(url: &Url) -> Result<PolitenessKey, UrlError> {
    match url.host() {
        None => Err(UrlError::MissingHost),
        Some(Host::Ipv4(ip)) => Ok(ip.to_string()),
        Some(Host::Ipv6(ip)) => Ok(ip.to_string()),
        Some(Host::Domain(host)) => {
            // Tolerate a trailing dot (fully-qualified form)
            let host = host.trim_end_matches('.');
            psl::domain_str(host)
                .map(|domain| domain.to_ascii_lowercase())
                .ok_or_else(|| UrlError::UnresolvableHost(host.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_for(raw: &str) -> Result<PolitenessKey, UrlError> {
        politeness_key(&Url::parse(raw).unwrap())
    }

    #[test]
    fn test_bare_domain() {
        assert_eq!(key_for("https://example.com/").unwrap(), "example.com");
    }

    #[test]
    fn test_subdomains_share_key() {
        let a = key_for("https://a.example.com/x").unwrap();
        let b = key_for("https://b.example.com/y").unwrap();
        let bare = key_for("https://example.com/").unwrap();
        assert_eq!(a, "example.com");
        assert_eq!(a, b);
        assert_eq!(a, bare);
    }

    #[test]
    fn test_www_shares_key_with_bare() {
        assert_eq!(
            key_for("https://www.example.com/").unwrap(),
            key_for("https://example.com/").unwrap()
        );
    }

    #[test]
    fn test_multi_part_suffix() {
        assert_eq!(key_for("https://a.b.co.uk/").unwrap(), "b.co.uk");
        assert_eq!(
            key_for("https://deep.sub.example.co.uk/").unwrap(),
            "example.co.uk"
        );
    }

    #[test]
    fn test_different_suffixes_different_keys() {
        let com = key_for("https://example.com/").unwrap();
        let co_uk = key_for("https://example.co.uk/").unwrap();
        assert_ne!(com, co_uk);
    }

    #[test]
    fn test_ipv4_is_its_own_key() {
        assert_eq!(key_for("http://127.0.0.1:8080/").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_ipv6_is_its_own_key() {
        assert_eq!(key_for("http://[::1]:8080/").unwrap(), "::1");
    }

    #[test]
    fn test_ports_do_not_affect_key() {
        assert_eq!(
            key_for("http://example.com:8080/").unwrap(),
            key_for("http://example.com:9090/").unwrap()
        );
    }

    #[test]
    fn test_localhost_unresolvable() {
        let result = key_for("http://localhost:8080/");
        assert!(matches!(result, Err(UrlError::UnresolvableHost(_))));
    }

    #[test]
    fn test_trailing_dot_tolerated() {
        assert_eq!(key_for("https://example.com./").unwrap(), "example.com");
    }

    #[test]
    fn test_key_is_stable() {
        let first = key_for("https://news.example.org/a").unwrap();
        let second = key_for("https://news.example.org/b").unwrap();
        assert_eq!(first, second);
    }
}
