//! Trait definition for pluggable job sources.
//!
//! Each upstream (GitHub Jobs, Indeed, Stack Overflow, LinkedIn, RemoteOK)
//! implements [`JobSource`]. The aggregator holds them as trait objects and
//! never inspects the concrete type: location semantics, pagination and
//! relaxation all live behind [`JobSource::fetch`].

use async_trait::async_trait;
use serde::Serialize;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::types::{JobListing, SearchQuery};

/// A pluggable job source.
///
/// Implementors handle their own:
///
/// - URL construction and query encoding
/// - pagination and politeness delays
/// - response parsing (JSON or HTML via CSS selectors)
/// - client-side filtering and location relaxation where needed
///
/// All implementations must be `Send + Sync` for concurrent fan-out.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Stable source identifier, stored on every listing it produces.
    fn name(&self) -> &str;

    /// Fetch and normalise listings for `query`, capped at `query.limit`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the source cannot be reached or its
    /// response cannot be parsed. Callers should go through
    /// [`JobSource::search`], which never fails.
    async fn fetch(
        &self,
        query: &SearchQuery,
        config: &SearchConfig,
    ) -> Result<Vec<JobListing>, SearchError>;

    /// Run [`JobSource::fetch`] under the per-source timeout and fold every
    /// failure into a [`SourceOutcome`].
    async fn search(&self, query: &SearchQuery, config: &SearchConfig) -> SourceOutcome {
        let name = self.name().to_string();
        match tokio::time::timeout(config.source_timeout(), self.fetch(query, config)).await {
            Ok(Ok(listings)) if listings.is_empty() => {
                tracing::debug!(source = %name, "source returned no listings");
                SourceOutcome::Empty
            }
            Ok(Ok(mut listings)) => {
                listings.truncate(query.limit);
                tracing::debug!(source = %name, count = listings.len(), "source returned listings");
                SourceOutcome::Found(listings)
            }
            Ok(Err(err)) => {
                tracing::warn!(source = %name, error = %err, "source unavailable");
                SourceOutcome::Unavailable(err.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    source = %name,
                    timeout_secs = config.timeout_seconds,
                    "source timed out"
                );
                SourceOutcome::TimedOut
            }
        }
    }
}

/// What one source contributed to a search.
///
/// Failures are values, not errors: an unavailable source is an expected
/// outcome and never aborts the aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// The source answered with at least one listing.
    Found(Vec<JobListing>),
    /// The source answered but had nothing matching.
    Empty,
    /// The source failed (network, status, parse); the reason is logged.
    Unavailable(String),
    /// The source overran its time budget.
    TimedOut,
}

impl SourceOutcome {
    /// Whether the source failed to answer.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::TimedOut)
    }

    /// The listings contributed, empty for anything but [`SourceOutcome::Found`].
    pub fn into_listings(self) -> Vec<JobListing> {
        match self {
            Self::Found(listings) => listings,
            _ => Vec::new(),
        }
    }

    /// Status label for reports.
    pub fn status(&self) -> SourceStatus {
        match self {
            Self::Found(_) => SourceStatus::Ok,
            Self::Empty => SourceStatus::Empty,
            Self::Unavailable(reason) => SourceStatus::Failed(reason.clone()),
            Self::TimedOut => SourceStatus::TimedOut,
        }
    }
}

/// Per-source status in a [`crate::orchestrator::search::SearchReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Empty,
    Failed(String),
    TimedOut,
    /// Not queried: the source's circuit is open.
    Skipped,
    /// Still running when the caller's deadline expired; its results were discarded.
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FixedSource {
        listings: Vec<JobListing>,
    }

    #[async_trait]
    impl JobSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch(
            &self,
            _query: &SearchQuery,
            _config: &SearchConfig,
        ) -> Result<Vec<JobListing>, SearchError> {
            Ok(self.listings.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl JobSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        async fn fetch(
            &self,
            _query: &SearchQuery,
            _config: &SearchConfig,
        ) -> Result<Vec<JobListing>, SearchError> {
            Err(SearchError::Http("connection reset".into()))
        }
    }

    struct SlowSource;

    #[async_trait]
    impl JobSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch(
            &self,
            _query: &SearchQuery,
            _config: &SearchConfig,
        ) -> Result<Vec<JobListing>, SearchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    fn listing(n: usize) -> JobListing {
        JobListing::new(format!("Job {n}"), "Acme", format!("https://acme.dev/{n}"), "fixed")
    }

    #[test]
    fn trait_objects_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn JobSource>();
    }

    #[tokio::test]
    async fn search_truncates_to_limit() {
        let source = FixedSource {
            listings: (0..5).map(listing).collect(),
        };
        let query = SearchQuery::new("rust").with_limit(2);
        let outcome = source.search(&query, &SearchConfig::default()).await;
        assert_eq!(outcome.status(), SourceStatus::Ok);
        assert_eq!(outcome.into_listings().len(), 2);
    }

    #[tokio::test]
    async fn empty_result_is_not_a_failure() {
        let source = FixedSource { listings: vec![] };
        let outcome = source
            .search(&SearchQuery::new("rust"), &SearchConfig::default())
            .await;
        assert_eq!(outcome, SourceOutcome::Empty);
        assert!(!outcome.is_failure());
    }

    #[tokio::test]
    async fn errors_are_swallowed() {
        let outcome = BrokenSource
            .search(&SearchQuery::new("rust"), &SearchConfig::default())
            .await;
        assert!(outcome.is_failure());
        assert!(matches!(outcome.status(), SourceStatus::Failed(reason) if reason.contains("connection reset")));
        assert!(outcome.into_listings().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let config = SearchConfig {
            timeout_seconds: 1,
            ..Default::default()
        };
        let outcome = SlowSource.search(&SearchQuery::new("rust"), &config).await;
        assert_eq!(outcome, SourceOutcome::TimedOut);
    }
}
