use crate::config::types::{FetcherPolicy, PolicyFile};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and validates a fetcher policy from a TOML file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use fetchpipe::config::load_policy;
///
/// let policy = load_policy(Path::new("fetcher.toml")).unwrap();
/// println!("Max threads: {}", policy.max_threads);
/// ```
pub fn load_policy(path: &Path) -> Result<FetcherPolicy, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let file: PolicyFile = toml::from_str(&content)?;
    validate(&file.fetcher)?;
    Ok(file.fetcher)
}

/// Computes a SHA-256 hash of the policy file content
///
/// Operators use this to detect policy drift between fetch rounds: a batch
/// fetched under one hash is comparable with other batches under the same
/// hash.
pub fn compute_policy_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a policy and returns it together with its content hash
pub fn load_policy_with_hash(path: &Path) -> Result<(FetcherPolicy, String), ConfigError> {
    let policy = load_policy(path)?;
    let hash = compute_policy_hash(path)?;
    Ok((policy, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_policy(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_policy() {
        let content = r#"
[fetcher]
max-threads = 10
crawl-delay-millis = 1000
fetch-timeout-millis = 30000
user-agent = "TestBot/1.0 (+https://example.com/bot)"
"#;

        let file = create_temp_policy(content);
        let policy = load_policy(file.path()).unwrap();

        assert_eq!(policy.max_threads, 10);
        assert_eq!(policy.crawl_delay_millis, 1000);
        assert_eq!(policy.fetch_timeout_millis, 30000);
        // Omitted keys fall back to defaults
        assert_eq!(policy.max_redirects, 5);
    }

    #[test]
    fn test_load_policy_with_invalid_path() {
        let result = load_policy(Path::new("/nonexistent/fetcher.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_policy_with_invalid_toml() {
        let file = create_temp_policy("this is not valid TOML {{{");
        let result = load_policy(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_policy_with_validation_error() {
        let content = r#"
[fetcher]
max-threads = 0
crawl-delay-millis = 1000
fetch-timeout-millis = 30000
user-agent = "TestBot/1.0"
"#;

        let file = create_temp_policy(content);
        let result = load_policy(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_policy_hash_is_stable() {
        let file = create_temp_policy("test content");

        let hash1 = compute_policy_hash(file.path()).unwrap();
        let hash2 = compute_policy_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_policy("content 1");
        let file2 = create_temp_policy("content 2");

        let hash1 = compute_policy_hash(file1.path()).unwrap();
        let hash2 = compute_policy_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_load_policy_with_hash() {
        let content = r#"
[fetcher]
max-threads = 2
crawl-delay-millis = 0
fetch-timeout-millis = 5000
user-agent = "TestBot/1.0"
"#;

        let file = create_temp_policy(content);
        let (policy, hash) = load_policy_with_hash(file.path()).unwrap();

        assert_eq!(policy.max_threads, 2);
        assert_eq!(hash, compute_policy_hash(file.path()).unwrap());
    }
}
