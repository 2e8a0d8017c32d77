//! In-memory cache for aggregated search results.
//!
//! Caches the final deduplicated, truncated listings keyed by everything
//! that shapes them: normalised query text, location, filters, limit and
//! the set of sources queried. Uses [`moka`] for async-friendly caching
//! with TTL expiry. Owned by one [`crate::Aggregator`].

use std::time::Duration;

use moka::future::Cache;

use crate::types::{ExperienceLevel, JobListing, JobType, SearchQuery};

/// Maximum number of cached result sets.
const MAX_CACHE_ENTRIES: u64 = 100;

/// Composite cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    location: String,
    job_type: Option<JobType>,
    experience_level: Option<ExperienceLevel>,
    limit: usize,
    /// Sorted source names, so registration order does not split entries.
    sources: Vec<String>,
}

impl CacheKey {
    pub fn new<'a>(query: &SearchQuery, sources: impl IntoIterator<Item = &'a str>) -> Self {
        let mut sources: Vec<String> = sources.into_iter().map(str::to_string).collect();
        sources.sort();
        sources.dedup();
        Self {
            query: normalise(&query.text),
            location: normalise(&query.location),
            job_type: query.job_type,
            experience_level: query.experience_level,
            limit: query.limit,
            sources,
        }
    }
}

fn normalise(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Result cache. A zero TTL disables it entirely.
#[derive(Clone)]
pub struct ResultCache {
    inner: Option<Cache<CacheKey, Vec<JobListing>>>,
}

impl ResultCache {
    pub fn new(ttl_seconds: u64) -> Self {
        let inner = (ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build()
        });
        Self { inner }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Cached listings for `key`, if present and unexpired.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<JobListing>> {
        self.inner.as_ref()?.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, listings: Vec<JobListing>) {
        if let Some(cache) = &self.inner {
            cache.insert(key, listings).await;
        }
    }
}
