//! Search-then-rank facade.

use std::sync::Arc;

use jobhunt_search::{Aggregator, JobListing, SearchQuery, SearchReport};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::HuntConfig;
use crate::error::Result;
use crate::matching::{MatchResult, Ranker, provider_from_config};
use crate::profile::CandidateProfile;
use crate::store::{JobStore, SqliteJobStore, save_new_listings};

/// Owns an aggregator, a ranker and an optional listing store.
pub struct JobHunter {
    aggregator: Aggregator,
    ranker: Ranker,
    store: Option<Arc<dyn JobStore>>,
}

impl JobHunter {
    pub fn new(aggregator: Aggregator, ranker: Ranker) -> Self {
        Self {
            aggregator,
            ranker,
            store: None,
        }
    }

    /// Persist new listings found by every search into `store`.
    pub fn with_store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build sources, embedding provider and store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the embedding
    /// model cannot be loaded, or the SQLite store cannot be opened.
    pub async fn from_config(config: &HuntConfig) -> Result<Self> {
        config.validate()?;
        let aggregator = Aggregator::new(config.search.clone())?;
        let embedder = provider_from_config(&config.embedding).await?;
        let ranker = Ranker::new(embedder, config.matching.clone());
        let hunter = Self::new(aggregator, ranker);
        match &config.storage.sqlite_path {
            Some(path) => Ok(hunter.with_store(Arc::new(SqliteJobStore::open(path)?))),
            None => Ok(hunter),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    /// Aggregate listings for `query` and store the new ones.
    ///
    /// # Errors
    ///
    /// Only for an invalid query. Source and store failures are logged.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<JobListing>> {
        Ok(self.search_report(query, None).await?.listings)
    }

    /// [`search`](Self::search) with per-source status and an optional deadline.
    pub async fn search_report(
        &self,
        query: &SearchQuery,
        deadline: Option<Instant>,
    ) -> Result<SearchReport> {
        let report = self.aggregator.search_until(query, deadline).await?;
        self.persist(&report.listings).await;
        Ok(report)
    }

    /// Search, then rank the results against `profile`. At most
    /// `query.limit` results, best first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::HuntError::EmbeddingUnavailable`] if ranking fails,
    /// and a search error for an invalid query.
    pub async fn match_jobs(
        &self,
        profile: &CandidateProfile,
        query: &SearchQuery,
    ) -> Result<Vec<MatchResult>> {
        self.match_jobs_until(profile, query, None).await
    }

    /// [`match_jobs`](Self::match_jobs) bounded by `deadline`, shared by the
    /// search and ranking phases.
    pub async fn match_jobs_until(
        &self,
        profile: &CandidateProfile,
        query: &SearchQuery,
        deadline: Option<Instant>,
    ) -> Result<Vec<MatchResult>> {
        let listings = self.search_report(query, deadline).await?.listings;
        if listings.is_empty() {
            info!("no listings found, nothing to rank");
            return Ok(Vec::new());
        }

        let mut ranked = self
            .ranker
            .rank_until(
                &profile.resume_text(),
                &profile.technical_skills,
                listings,
                deadline,
            )
            .await?;
        ranked.truncate(query.limit);
        Ok(ranked)
    }

    /// Store writes are blocking I/O, so they run on the blocking pool.
    async fn persist(&self, listings: &[JobListing]) {
        let Some(store) = &self.store else {
            return;
        };
        if listings.is_empty() {
            return;
        }
        let store = Arc::clone(store);
        let listings = listings.to_vec();
        let joined =
            tokio::task::spawn_blocking(move || save_new_listings(store.as_ref(), &listings))
                .await;
        match joined {
            Ok(Ok(0)) => {}
            Ok(Ok(saved)) => info!(saved, "persisted new listings"),
            Ok(Err(e)) => warn!(error = %e, "failed to persist listings"),
            Err(e) => warn!(error = %e, "persist task failed"),
        }
    }
}
