//! # jobhunt-search
//!
//! Concurrent job listing aggregation across unreliable public sources.
//!
//! This crate queries job boards, listing pages and public feeds directly,
//! normalises their divergent schemas into [`JobListing`], and merges the
//! results. It compiles into jobhunt as a library dependency.
//!
//! ## Design
//!
//! - Sources implement [`JobSource`] and are held as trait objects
//! - Every source runs concurrently under its own timeout; a failing or slow
//!   source contributes nothing and never fails the search
//! - Listings are deduplicated by canonical URL, first discovered wins
//! - Client-side filtering expands acronyms (`ml` → `machine learning`)
//! - Per-source circuit breaker and in-memory result cache, both owned by
//!   the [`Aggregator`] instance
//! - User-Agent rotation and politeness delays between page fetches
//!
//! ## Logging
//!
//! - Query text is logged only at trace level
//! - Every swallowed source failure is logged at warn level

pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod query;
pub mod source;
pub mod sources;
pub mod types;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use orchestrator::search::{Aggregator, SearchReport, SourceReport};
pub use query::{normalize_query, NormalizedQuery};
pub use source::{JobSource, SourceOutcome, SourceStatus};
pub use types::{ExperienceLevel, JobListing, JobType, SearchQuery, SourceKind, DEFAULT_LIMIT};

/// Search the built-in sources enabled in `config`.
///
/// Builds a one-off [`Aggregator`]; hold an `Aggregator` instead to keep
/// the circuit breaker and cache across searches.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid configuration and
/// [`SearchError::InvalidQuery`] for an invalid query. Source failures are
/// logged and never returned.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> jobhunt_search::Result<()> {
/// let config = jobhunt_search::SearchConfig::default();
/// let query = jobhunt_search::SearchQuery::new("ml engineer").with_location("Bangalore");
/// let listings = jobhunt_search::search_jobs(&query, &config).await?;
/// for job in &listings {
///     println!("{} at {}: {}", job.title, job.company, job.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search_jobs(query: &SearchQuery, config: &SearchConfig) -> Result<Vec<JobListing>> {
    Aggregator::new(config.clone())?.search_all(query).await
}
