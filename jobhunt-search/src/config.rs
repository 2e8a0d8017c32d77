//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which sources are queried, timeouts, caching,
//! pagination and politeness. The defaults are tuned for reliable, polite
//! scraping.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SearchError;
use crate::types::SourceKind;

/// Configuration for job aggregation.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Which sources to query, in registration order. Queried concurrently;
    /// results are concatenated in this order.
    pub sources: Vec<SourceKind>,
    /// Per-source time budget in seconds. A source that overruns contributes
    /// nothing.
    pub timeout_seconds: u64,
    /// Overall deadline for one aggregation in seconds. 0 disables it.
    pub deadline_seconds: u64,
    /// Random delay range in milliseconds `(min, max)` between successive
    /// page fetches within one source.
    pub request_delay_ms: (u64, u64),
    /// Upper bound on pages fetched by paginating sources.
    pub max_pages: usize,
    /// How long to cache aggregated results in seconds. 0 disables caching.
    pub cache_ttl_seconds: u64,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// Consecutive failures before a source is temporarily skipped.
    pub failure_threshold: u32,
    /// Seconds a tripped source stays skipped before one trial search is allowed.
    pub cooldown_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                SourceKind::GitHubJobs,
                SourceKind::StackOverflow,
                SourceKind::Indeed,
                SourceKind::RemoteOk,
            ],
            timeout_seconds: 20,
            deadline_seconds: 60,
            request_delay_ms: (1_000, 2_000),
            max_pages: 6,
            cache_ttl_seconds: 600,
            user_agent: None,
            failure_threshold: 3,
            cooldown_seconds: 300,
        }
    }
}

impl SearchConfig {
    /// Per-source timeout as a [`Duration`].
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Overall aggregation deadline, if one is configured.
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_seconds > 0).then(|| Duration::from_secs(self.deadline_seconds))
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `timeout_seconds` must be greater than 0
    /// - `sources` must not be empty
    /// - `request_delay_ms.0` must be <= `request_delay_ms.1`
    /// - `max_pages` must be greater than 0
    /// - `failure_threshold` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.sources.is_empty() {
            return Err(SearchError::Config(
                "at least one source must be enabled".into(),
            ));
        }
        if self.request_delay_ms.0 > self.request_delay_ms.1 {
            return Err(SearchError::Config(
                "request_delay_ms min must be <= max".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(SearchError::Config(
                "max_pages must be greater than 0".into(),
            ));
        }
        if self.failure_threshold == 0 {
            return Err(SearchError::Config(
                "failure_threshold must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.timeout_seconds, 20);
        assert_eq!(config.deadline_seconds, 60);
        assert_eq!(config.request_delay_ms, (1_000, 2_000));
        assert_eq!(config.cache_ttl_seconds, 600);
        assert!(config.user_agent.is_none());
        assert_eq!(config.failure_threshold, 3);
    }

    #[test]
    fn default_sources_exclude_linkedin() {
        let config = SearchConfig::default();
        assert_eq!(config.sources.len(), 4);
        assert_eq!(config.sources[0], SourceKind::GitHubJobs);
        assert!(config.sources.contains(&SourceKind::RemoteOk));
        assert!(!config.sources.contains(&SourceKind::LinkedIn));
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = SearchConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn empty_sources_rejected() {
        let config = SearchConfig {
            sources: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source"));
    }

    #[test]
    fn invalid_delay_range_rejected() {
        let config = SearchConfig {
            request_delay_ms: (500, 100),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("delay"));
    }

    #[test]
    fn zero_max_pages_rejected() {
        let config = SearchConfig {
            max_pages: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_deadline_disables_it() {
        let config = SearchConfig {
            deadline_seconds: 0,
            ..Default::default()
        };
        assert!(config.deadline().is_none());
        assert_eq!(
            SearchConfig::default().deadline(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"sources": ["remoteok"], "timeout_seconds": 5}"#)
                .expect("deserialize");
        assert_eq!(config.sources, vec![SourceKind::RemoteOk]);
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.max_pages, 6);
    }
}
