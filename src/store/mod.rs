//! Persistence collaborators for discovered listings.
//!
//! Listings are keyed by canonical URL, the same form the aggregator
//! deduplicates on, so a posting that comes back with different tracking
//! parameters is still recognised. The search pipeline only ever asks
//! whether a URL is known and saves the ones that are not.

pub mod schema;
pub mod sqlite;

use std::collections::HashMap;
use std::sync::Mutex;

use jobhunt_search::JobListing;
use jobhunt_search::orchestrator::url_normalize::normalize_url;
use tracing::debug;

use crate::error::Result;

pub use sqlite::SqliteJobStore;

/// Storage for listings, keyed by canonical URL.
pub trait JobStore: Send + Sync {
    /// Whether a listing with this URL, in canonical form, is stored.
    fn exists(&self, url: &str) -> Result<bool>;

    /// Store a listing. Returns whether it was inserted; a listing that is
    /// already stored is left untouched and yields `false`.
    fn save(&self, listing: &JobListing) -> Result<bool>;
}

/// Save the listings whose URL is not yet stored. Returns how many rows
/// were actually inserted.
///
/// # Errors
///
/// Stops at the first store error.
pub fn save_new_listings(store: &dyn JobStore, listings: &[JobListing]) -> Result<usize> {
    let mut saved = 0;
    for listing in listings {
        if store.exists(&listing.url)? {
            continue;
        }
        if store.save(listing)? {
            saved += 1;
        }
    }
    debug!(saved, total = listings.len(), "stored new listings");
    Ok(saved)
}

/// Process-local store, mostly for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    listings: Mutex<HashMap<String, JobListing>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.listings
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, url: &str) -> Option<JobListing> {
        self.listings
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&normalize_url(url))
            .cloned()
    }
}

impl JobStore for InMemoryJobStore {
    fn exists(&self, url: &str) -> Result<bool> {
        Ok(self
            .listings
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(&normalize_url(url)))
    }

    fn save(&self, listing: &JobListing) -> Result<bool> {
        let mut listings = self.listings.lock().unwrap_or_else(|p| p.into_inner());
        let key = normalize_url(&listing.url);
        if listings.contains_key(&key) {
            return Ok(false);
        }
        listings.insert(key, listing.clone());
        Ok(true)
    }
}
