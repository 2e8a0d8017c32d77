//! Core aggregation: concurrent multi-source fan-out, identify, dedup,
//! truncate.
//!
//! Every registered source runs as its own task under the per-source
//! timeout. Failures and timeouts stay inside the source's slot; results are
//! concatenated in registration order regardless of completion order.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use tokio::time::Instant;

use crate::cache::{CacheKey, ResultCache};
use crate::circuit_breaker::CircuitBreaker;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::source::{JobSource, SourceOutcome, SourceStatus};
use crate::sources::sources_from_config;
use crate::types::{JobListing, SearchQuery};

use super::dedup::deduplicate;

/// What one source contributed to an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub status: SourceStatus,
    /// Listings returned before deduplication.
    pub count: usize,
}

/// Aggregated listings plus per-source diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub listings: Vec<JobListing>,
    /// One entry per registered source, in registration order. Empty when
    /// the listings came from the cache.
    pub sources: Vec<SourceReport>,
    pub cached: bool,
    /// Whether the deadline expired before every source finished.
    pub deadline_expired: bool,
}

/// Fans a query out to a fixed set of sources.
///
/// Holds the sources, the search configuration, a circuit breaker and a
/// result cache. Cheap to share behind an `Arc`; every method takes `&self`.
pub struct Aggregator {
    sources: Vec<Arc<dyn JobSource>>,
    config: SearchConfig,
    breaker: Mutex<CircuitBreaker>,
    cache: ResultCache,
}

impl Aggregator {
    /// Build an aggregator over the built-in sources enabled in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let sources = sources_from_config(&config);
        Self::with_sources(sources, config)
    }

    /// Build an aggregator over caller-supplied sources, queried in the
    /// given order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn with_sources(
        sources: Vec<Arc<dyn JobSource>>,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            breaker: Mutex::new(CircuitBreaker::from_config(&config)),
            cache: ResultCache::new(config.cache_ttl_seconds),
            sources,
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Registered source names, in registration order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Search every source and return the merged, deduplicated listings,
    /// at most `query.limit` of them.
    ///
    /// # Errors
    ///
    /// Only [`SearchError::InvalidQuery`]; source failures never surface.
    pub async fn search_all(&self, query: &SearchQuery) -> Result<Vec<JobListing>, SearchError> {
        Ok(self.search_all_with_report(query).await?.listings)
    }

    /// Like [`Aggregator::search_all`], with per-source status.
    pub async fn search_all_with_report(
        &self,
        query: &SearchQuery,
    ) -> Result<SearchReport, SearchError> {
        self.search_until(query, None).await
    }

    /// Search with a caller deadline. Sources still running when it expires
    /// are abandoned and whatever completed is returned.
    ///
    /// The configured `deadline_seconds` applies as well; the earlier of
    /// the two wins.
    pub async fn search_until(
        &self,
        query: &SearchQuery,
        deadline: Option<Instant>,
    ) -> Result<SearchReport, SearchError> {
        query.validate()?;

        let configured = self.config.deadline().map(|d| Instant::now() + d);
        let deadline = match (deadline, configured) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        let key = CacheKey::new(query, self.source_names());
        if let Some(listings) = self.cache.get(&key).await {
            tracing::debug!(count = listings.len(), "returning cached listings");
            return Ok(SearchReport {
                listings,
                sources: Vec::new(),
                cached: true,
                deadline_expired: false,
            });
        }

        tracing::trace!(query = %query.text, location = %query.location, "aggregating");

        let (outcomes, skipped, deadline_expired) = self.fan_out(query, deadline).await;

        let mut listings = Vec::new();
        let mut sources = Vec::with_capacity(self.sources.len());
        {
            let mut breaker = self.breaker();
            for (index, source) in self.sources.iter().enumerate() {
                let name = source.name();
                let (status, found) = if skipped[index] {
                    (SourceStatus::Skipped, Vec::new())
                } else {
                    match outcomes[index].clone() {
                        Some(outcome) => {
                            if outcome.is_failure() {
                                breaker.record_failure(name);
                            } else {
                                breaker.record_success(name);
                            }
                            (outcome.status(), outcome.into_listings())
                        }
                        None => {
                            breaker.release(name);
                            (SourceStatus::Abandoned, Vec::new())
                        }
                    }
                };
                sources.push(SourceReport {
                    name: name.to_string(),
                    status,
                    count: found.len(),
                });
                listings.extend(found);
            }
        }

        assign_missing_ids(&mut listings);
        let mut listings = deduplicate(listings);
        listings.truncate(query.limit);

        tracing::debug!(
            count = listings.len(),
            sources = sources.len(),
            deadline_expired,
            "aggregation finished"
        );

        // Only complete answers are cached; a failed source is retried next call.
        let complete = !deadline_expired
            && sources
                .iter()
                .all(|r| matches!(r.status, SourceStatus::Ok | SourceStatus::Empty));
        if complete {
            self.cache.insert(key, listings.clone()).await;
        }

        Ok(SearchReport {
            listings,
            sources,
            cached: false,
            deadline_expired,
        })
    }

    /// Run every admitted source concurrently. Returns per-slot outcomes
    /// (`None` where abandoned), per-slot skip flags, and whether the
    /// deadline cut the wait short.
    async fn fan_out(
        &self,
        query: &SearchQuery,
        deadline: Option<Instant>,
    ) -> (Vec<Option<SourceOutcome>>, Vec<bool>, bool) {
        let n = self.sources.len();
        let mut outcomes: Vec<Option<SourceOutcome>> = vec![None; n];
        let mut skipped = vec![false; n];

        let mut pending = FuturesUnordered::new();
        let mut abort_handles = Vec::with_capacity(n);
        {
            let mut breaker = self.breaker();
            for (index, source) in self.sources.iter().enumerate() {
                if !breaker.should_attempt(source.name()) {
                    tracing::debug!(source = source.name(), "circuit open, skipping");
                    skipped[index] = true;
                    continue;
                }
                let source = Arc::clone(source);
                let query = query.clone();
                let config = self.config.clone();
                let handle =
                    tokio::spawn(async move { source.search(&query, &config).await });
                abort_handles.push(handle.abort_handle());
                pending.push(handle.map(move |joined| (index, joined)));
            }
        }

        let mut deadline_expired = false;
        loop {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, pending.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        deadline_expired = true;
                        break;
                    }
                },
                None => pending.next().await,
            };
            let Some((index, joined)) = next else {
                break;
            };
            let outcome = joined.unwrap_or_else(|err| {
                tracing::warn!(
                    source = self.sources[index].name(),
                    error = %err,
                    "source task failed"
                );
                SourceOutcome::Unavailable(format!("task failed: {err}"))
            });
            outcomes[index] = Some(outcome);
        }

        if deadline_expired {
            let abandoned = outcomes
                .iter()
                .zip(&skipped)
                .filter(|(o, s)| o.is_none() && !**s)
                .count();
            tracing::warn!(abandoned, "deadline expired, abandoning running sources");
            for handle in &abort_handles {
                handle.abort();
            }
        }

        (outcomes, skipped, deadline_expired)
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Give every listing without a source identifier a fresh UUID.
fn assign_missing_ids(listings: &mut [JobListing]) {
    for listing in listings.iter_mut().filter(|l| l.id.is_none()) {
        listing.id = Some(uuid::Uuid::new_v4().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Canned {
        name: &'static str,
        urls: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl Canned {
        fn new(name: &'static str, urls: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                urls,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl JobSource for Canned {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(
            &self,
            _query: &SearchQuery,
            _config: &SearchConfig,
        ) -> Result<Vec<JobListing>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .urls
                .iter()
                .map(|url| JobListing::new("Engineer", "Acme", *url, self.name))
                .collect())
        }
    }

    struct Failing;

    #[async_trait]
    impl JobSource for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch(
            &self,
            _query: &SearchQuery,
            _config: &SearchConfig,
        ) -> Result<Vec<JobListing>, SearchError> {
            Err(SearchError::Http("503 Service Unavailable".into()))
        }
    }

    fn config() -> SearchConfig {
        SearchConfig {
            cache_ttl_seconds: 0,
            deadline_seconds: 0,
            request_delay_ms: (0, 0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn concatenates_in_registration_order_and_dedups() {
        let first = Canned::new("first", vec!["https://a.dev/1", "https://a.dev/2"]);
        let second = Canned::new("second", vec!["https://a.dev/2", "https://b.dev/3"]);
        let aggregator = Aggregator::with_sources(vec![first, second], config()).expect("agg");

        let report = aggregator
            .search_all_with_report(&SearchQuery::new("rust"))
            .await
            .expect("search");
        let urls: Vec<_> = report.listings.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.dev/1", "https://a.dev/2", "https://b.dev/3"]);
        assert_eq!(report.listings[1].source, "first");
        assert_eq!(report.sources[1].count, 2);
    }

    #[tokio::test]
    async fn missing_ids_are_generated() {
        let source = Canned::new("only", vec!["https://a.dev/1", "https://a.dev/2"]);
        let aggregator = Aggregator::with_sources(vec![source], config()).expect("agg");
        let listings = aggregator
            .search_all(&SearchQuery::new("rust"))
            .await
            .expect("search");
        let ids: Vec<_> = listings.iter().filter_map(|l| l.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[tokio::test]
    async fn truncates_after_dedup() {
        let source = Canned::new(
            "only",
            vec!["https://a.dev/1", "https://a.dev/1", "https://a.dev/2", "https://a.dev/3"],
        );
        let aggregator = Aggregator::with_sources(vec![source], config()).expect("agg");
        let listings = aggregator
            .search_all(&SearchQuery::new("rust").with_limit(2))
            .await
            .expect("search");
        let urls: Vec<_> = listings.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.dev/1", "https://a.dev/2"]);
    }

    #[tokio::test]
    async fn invalid_query_rejected_before_sources_run() {
        let source = Canned::new("only", vec!["https://a.dev/1"]);
        let aggregator =
            Aggregator::with_sources(vec![source.clone()], config()).expect("agg");
        let err = aggregator
            .search_all(&SearchQuery::new("rust").with_limit(0))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_source_is_reported_not_raised() {
        let good = Canned::new("good", vec!["https://a.dev/1"]);
        let aggregator =
            Aggregator::with_sources(vec![Arc::new(Failing), good], config()).expect("agg");
        let report = aggregator
            .search_all_with_report(&SearchQuery::new("rust"))
            .await
            .expect("search");
        assert_eq!(report.listings.len(), 1);
        assert!(matches!(report.sources[0].status, SourceStatus::Failed(_)));
        assert_eq!(report.sources[1].status, SourceStatus::Ok);
    }

    #[tokio::test]
    async fn open_circuit_skips_source() {
        let cfg = SearchConfig {
            failure_threshold: 1,
            cooldown_seconds: 3_600,
            ..config()
        };
        let aggregator = Aggregator::with_sources(vec![Arc::new(Failing)], cfg).expect("agg");
        let query = SearchQuery::new("rust");

        let first = aggregator.search_all_with_report(&query).await.expect("first");
        assert!(matches!(first.sources[0].status, SourceStatus::Failed(_)));

        let second = aggregator.search_all_with_report(&query).await.expect("second");
        assert_eq!(second.sources[0].status, SourceStatus::Skipped);
        assert!(second.listings.is_empty());
    }

    #[tokio::test]
    async fn second_identical_search_hits_cache() {
        let source = Canned::new("only", vec!["https://a.dev/1"]);
        let cfg = SearchConfig {
            cache_ttl_seconds: 600,
            ..config()
        };
        let aggregator = Aggregator::with_sources(vec![source.clone()], cfg).expect("agg");
        let query = SearchQuery::new("Rust");

        let first = aggregator.search_all_with_report(&query).await.expect("first");
        let second = aggregator
            .search_all_with_report(&SearchQuery::new("rust"))
            .await
            .expect("second");
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.listings, second.listings);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    /// Fails its first call, succeeds afterwards.
    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl JobSource for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn fetch(
            &self,
            _query: &SearchQuery,
            _config: &SearchConfig,
        ) -> Result<Vec<JobListing>, SearchError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(SearchError::Http("503 Service Unavailable".into()));
            }
            Ok(vec![JobListing::new("Engineer", "Acme", "https://flaky.dev/1", "flaky")])
        }
    }

    #[tokio::test]
    async fn failed_search_is_not_cached() {
        let flaky = Arc::new(Flaky {
            calls: AtomicUsize::new(0),
        });
        let cfg = SearchConfig {
            cache_ttl_seconds: 600,
            failure_threshold: 5,
            ..config()
        };
        let aggregator = Aggregator::with_sources(vec![flaky.clone()], cfg).expect("agg");
        let query = SearchQuery::new("rust");

        let first = aggregator.search_all_with_report(&query).await.expect("first");
        assert!(matches!(first.sources[0].status, SourceStatus::Failed(_)));
        assert!(first.listings.is_empty());

        let second = aggregator.search_all_with_report(&query).await.expect("second");
        assert!(!second.cached);
        assert_eq!(second.sources[0].status, SourceStatus::Ok);
        assert_eq!(second.listings.len(), 1);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);

        let third = aggregator.search_all_with_report(&query).await.expect("third");
        assert!(third.cached);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn partially_failed_search_is_not_cached() {
        let good = Canned::new("good", vec!["https://a.dev/1"]);
        let cfg = SearchConfig {
            cache_ttl_seconds: 600,
            failure_threshold: 5,
            ..config()
        };
        let aggregator =
            Aggregator::with_sources(vec![Arc::new(Failing), good.clone()], cfg).expect("agg");
        let query = SearchQuery::new("rust");

        aggregator.search_all_with_report(&query).await.expect("first");
        let second = aggregator.search_all_with_report(&query).await.expect("second");
        assert!(!second.cached);
        assert_eq!(good.calls.load(Ordering::SeqCst), 2);
    }

    struct Sleepy;

    #[async_trait]
    impl JobSource for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }

        async fn fetch(
            &self,
            _query: &SearchQuery,
            _config: &SearchConfig,
        ) -> Result<Vec<JobListing>, SearchError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(vec![JobListing::new("Late", "Acme", "https://late.dev/1", "sleepy")])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_returns_completed_sources() {
        let fast = Canned::new("fast", vec!["https://a.dev/1"]);
        let cfg = SearchConfig {
            timeout_seconds: 60,
            cache_ttl_seconds: 600,
            ..config()
        };
        let aggregator =
            Aggregator::with_sources(vec![Arc::new(Sleepy), fast], cfg).expect("agg");
        let query = SearchQuery::new("rust");

        let report = aggregator
            .search_until(&query, Some(Instant::now() + Duration::from_secs(1)))
            .await
            .expect("search");
        assert!(report.deadline_expired);
        assert_eq!(report.sources[0].status, SourceStatus::Abandoned);
        assert_eq!(report.sources[1].status, SourceStatus::Ok);
        assert_eq!(report.listings.len(), 1);

        // Cut-short results are not cached.
        let again = aggregator.search_all_with_report(&query).await.expect("again");
        assert!(!again.cached);
    }
}
