//! Listing deduplication by canonical URL.
//!
//! The URL is a listing's identity. Among listings whose canonical URLs
//! are equal, the first one in input order survives and the others are
//! dropped. Input order is preserved.

use std::collections::HashSet;

use crate::types::JobListing;

use super::url_normalize::normalize_url;

/// Remove listings whose canonical URL was already seen.
///
/// Listings with an empty URL cannot be identified and are dropped.
/// Applying this twice gives the same result as applying it once.
pub fn deduplicate(listings: Vec<JobListing>) -> Vec<JobListing> {
    let mut seen: HashSet<String> = HashSet::with_capacity(listings.len());
    let total = listings.len();

    let kept: Vec<JobListing> = listings
        .into_iter()
        .filter(|listing| {
            let key = normalize_url(&listing.url);
            if key.is_empty() {
                tracing::debug!(
                    source = %listing.source,
                    title = %listing.title,
                    "dropping listing without URL"
                );
                return false;
            }
            seen.insert(key)
        })
        .collect();

    tracing::debug!(before = total, after = kept.len(), "deduplicated listings");
    kept
}
