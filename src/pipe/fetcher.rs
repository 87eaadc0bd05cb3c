//! HTTP fetcher
//!
//! Performs a single HTTP GET under the policy's constraints and returns a
//! [`FetchedDatum`] or a typed failure. Network-level failures are never
//! raised to the caller; they are recorded on the emitted datum. Redirects
//! are handled manually so the hop limit and terminal URL stay under our
//! control.

use crate::config::FetcherPolicy;
use crate::pipe::datum::{FetchErrorKind, FetchedDatum};
use reqwest::header::LOCATION;
use reqwest::{redirect::Policy, Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Connect-phase timeout, independent of the policy's total fetch timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client configured from the fetcher policy
///
/// The client sends the policy's user agent, enforces the policy's total
/// request timeout, decodes gzip/brotli bodies, and performs no automatic
/// redirect handling.
pub fn build_http_client(policy: &FetcherPolicy) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(policy.user_agent.clone())
        .timeout(policy.fetch_timeout())
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches single URLs under an immutable policy
///
/// A pure function of URL and policy to result: holds no mutable state, so
/// one instance is shared by all workers. Construction is the only
/// fallible operation; [`HttpFetcher::fetch`] always returns a datum.
pub struct HttpFetcher {
    client: Client,
    policy: FetcherPolicy,
}

impl HttpFetcher {
    /// Creates a fetcher for the given policy
    ///
    /// Fails only for configuration-level problems (client construction);
    /// this is a fatal error, unlike anything that happens per URL.
    pub fn new(policy: FetcherPolicy) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&policy)?;
        Ok(Self { client, policy })
    }

    /// Fetches a URL, following redirects up to the policy's hop limit
    ///
    /// Never fails for network-level problems: connection errors,
    /// including connect-phase timeouts, are retried once transparently
    /// (covers stale pooled connections), then recorded on the datum.
    /// Fetch-deadline timeouts are recorded without retry. The returned
    /// datum always answers for `url`.
    pub async fn fetch(&self, url: &Url) -> FetchedDatum {
        match self.attempt(url).await {
            Ok(datum) => datum,
            Err(FetchErrorKind::ConnectionError) => {
                tracing::debug!("Connection error fetching {}, retrying once", url);
                match self.attempt(url).await {
                    Ok(datum) => datum,
                    Err(kind) => FetchedDatum::failure(url.to_string(), kind),
                }
            }
            Err(kind) => FetchedDatum::failure(url.to_string(), kind),
        }
    }

    /// One complete fetch attempt, including the redirect chain
    async fn attempt(&self, url: &Url) -> Result<FetchedDatum, FetchErrorKind> {
        let mut current = url.clone();

        // max_redirects hops after the initial request
        for _hop in 0..=self.policy.max_redirects {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| classify_error(&e))?;

            let status = response.status();
            if status.is_redirection() {
                match redirect_target(&current, &response) {
                    Some(next) => {
                        tracing::trace!("Redirect {} -> {}", current, next);
                        current = next;
                        continue;
                    }
                    // Redirect status without a usable Location is terminal
                    None => return Ok(self.finish(url, &current, response).await?),
                }
            }

            return Ok(self.finish(url, &current, response).await?);
        }

        tracing::debug!(
            "Redirect chain from {} exceeded {} hops",
            url,
            self.policy.max_redirects
        );
        Err(FetchErrorKind::TooManyRedirects)
    }

    /// Turns the terminal response into a datum
    async fn finish(
        &self,
        original: &Url,
        current: &Url,
        response: Response,
    ) -> Result<FetchedDatum, FetchErrorKind> {
        let status = response.status().as_u16();
        let headers = collect_headers(&response);

        let content = response
            .bytes()
            .await
            .map_err(|e| classify_error(&e))?
            .to_vec();

        let new_base_url = if current.as_str() != original.as_str() {
            Some(current.to_string())
        } else {
            None
        };

        Ok(FetchedDatum::success(
            original.to_string(),
            status,
            headers,
            content,
            new_base_url,
        ))
    }
}

/// Resolves the Location header of a redirect response against the current
/// URL; relative targets are allowed
fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

/// Flattens response headers into the datum's string map
///
/// Header names are already lowercase; values that are not valid UTF-8 are
/// dropped rather than mangled.
fn collect_headers(response: &Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// Classifies a transport error into a recorded failure kind
///
/// Connect-phase failures are checked first: a timeout while connecting is
/// still a connection-level failure and takes the transparent retry path,
/// not the terminal `Timeout` reserved for the fetch deadline.
fn classify_error(error: &reqwest::Error) -> FetchErrorKind {
    if error.is_connect() {
        // DNS failure, refused, reset, TLS failure, hung connect
        FetchErrorKind::ConnectionError
    } else if error.is_timeout() {
        FetchErrorKind::Timeout
    } else {
        // Stale pooled connection, truncated body, protocol error
        FetchErrorKind::ConnectionError
    }
}
