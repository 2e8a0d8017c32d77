//! Shared HTTP client with User-Agent rotation and politeness delays.
//!
//! Provides a configured [`reqwest::Client`] with browser-like headers,
//! cookie support, and rotating User-Agent strings, plus the jittered pause
//! paginating sources take between page fetches.

use crate::config::SearchConfig;
use crate::error::SearchError;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

/// Realistic browser User-Agent strings, rotated per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`reqwest::Client`] configured for job-source requests.
///
/// The client has:
/// - Cookie store enabled (consent and session cookies on listing pages)
/// - Request timeout equal to the per-source timeout
/// - Random User-Agent from the rotation list (or custom if configured)
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(config.source_timeout())
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

/// Pick a delay within `config.request_delay_ms`.
pub fn politeness_delay(config: &SearchConfig) -> Duration {
    let (min, max) = config.request_delay_ms;
    if min >= max {
        return Duration::from_millis(min);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min..=max))
}

/// Sleep for a politeness delay before the next page fetch.
pub async fn pause_between_pages(config: &SearchConfig) {
    let delay = politeness_delay(config);
    if !delay.is_zero() {
        tracing::trace!(delay_ms = delay.as_millis() as u64, "politeness delay");
        tokio::time::sleep(delay).await;
    }
}

/// Send a prepared request and return the body text, mapping transport and
/// status failures to [`SearchError::Http`] tagged with the source name.
pub async fn fetch_text(
    request: reqwest::RequestBuilder,
    source: &str,
) -> Result<String, SearchError> {
    let response = request
        .send()
        .await
        .map_err(|e| SearchError::Http(format!("{source} request failed: {e}")))?
        .error_for_status()
        .map_err(|e| SearchError::Http(format!("{source} HTTP error: {e}")))?;

    let body = response
        .text()
        .await
        .map_err(|e| SearchError::Http(format!("{source} response read failed: {e}")))?;

    tracing::trace!(source, bytes = body.len(), "response received");
    Ok(body)
}
