use crate::config::types::FetcherPolicy;
use crate::ConfigError;

/// Validates a fetcher policy
///
/// Rejects out-of-range values eagerly so a bad policy aborts the run
/// before any URL is dispatched.
pub fn validate(policy: &FetcherPolicy) -> Result<(), ConfigError> {
    if policy.max_threads < 1 {
        return Err(ConfigError::Validation(format!(
            "max_threads must be >= 1, got {}",
            policy.max_threads
        )));
    }

    if policy.fetch_timeout_millis < 1 {
        return Err(ConfigError::Validation(
            "fetch_timeout_millis must be >= 1".to_string(),
        ));
    }

    if policy.stale_after_millis < 1 {
        return Err(ConfigError::Validation(
            "stale_after_millis must be >= 1".to_string(),
        ));
    }

    if policy.max_redirects < 1 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be >= 1, got {}",
            policy.max_redirects
        )));
    }

    validate_user_agent(&policy.user_agent)?;

    Ok(())
}

/// Validates the identification string sent to remote servers
///
/// The user agent must be non-empty and header-safe (visible ASCII plus
/// spaces), since it goes out verbatim on every request.
fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if !user_agent
        .chars()
        .all(|c| c.is_ascii_graphic() || c == ' ')
    {
        return Err(ConfigError::Validation(format!(
            "user_agent must contain only printable ASCII, got '{}'",
            user_agent
        )));
    }

    Ok(())
}
