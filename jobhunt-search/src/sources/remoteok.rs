//! RemoteOK public feed: the whole catalogue in one JSON array, filtered
//! client-side.
//!
//! The feed is fetched once per search. When a location filter leaves
//! nothing, the same feed is filtered again without the location. That
//! relaxation happens at most once.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::query::{location_matches, normalize_query, NormalizedQuery};
use crate::source::JobSource;
use crate::types::{JobListing, JobType, SearchQuery, SourceKind};

use super::parse_posted_at;

const DEFAULT_BASE_URL: &str = "https://remoteok.com";

/// RemoteOK JSON feed.
pub struct RemoteOkSource {
    base_url: String,
}

impl Default for RemoteOkSource {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl RemoteOkSource {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl JobSource for RemoteOkSource {
    fn name(&self) -> &str {
        SourceKind::RemoteOk.name()
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        config: &SearchConfig,
    ) -> Result<Vec<JobListing>, SearchError> {
        tracing::trace!(query = %query.text, location = %query.location, "RemoteOK search");

        let client = http::build_client(config)?;
        let request = client.get(format!("{}/api", self.base_url));
        let body = http::fetch_text(request, self.name()).await?;
        let items: Vec<Value> = serde_json::from_str(&body)
            .map_err(|e| SearchError::Parse(format!("RemoteOK feed is not a JSON array: {e}")))?;

        let (listings, relaxed) = filter_feed(&items, query);
        if relaxed {
            tracing::warn!(
                source = self.name(),
                location = %query.location,
                found = listings.len(),
                "no listings for location, relaxed location filter"
            );
        }
        Ok(listings)
    }
}

/// Filter the feed for `query`, relaxing the location filter once if it
/// leaves nothing.
///
/// Returns the listings and whether the relaxation was applied.
pub(crate) fn filter_feed(items: &[Value], query: &SearchQuery) -> (Vec<JobListing>, bool) {
    let normalized = normalize_query(&query.text);
    let mut location = query.location.as_str();
    let mut relaxed = false;

    loop {
        let listings = filter_pass(items, &normalized, location, query.limit);
        if listings.is_empty() && !relaxed && !location.trim().is_empty() {
            relaxed = true;
            location = "";
            continue;
        }
        return (listings, relaxed);
    }
}

fn filter_pass(
    items: &[Value],
    query: &NormalizedQuery,
    location: &str,
    limit: usize,
) -> Vec<JobListing> {
    items
        .iter()
        .filter_map(|item| {
            let position = str_field(item, "position")?;
            let tags = item
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            let company = str_field(item, "company").unwrap_or_default();
            let haystack = format!("{position} {company} {tags}");
            if !query.matches(&haystack) {
                return None;
            }
            let job_location = str_field(item, "location").unwrap_or_default();
            if !location_matches(location, job_location) {
                return None;
            }
            Some(to_listing(item, position, company, job_location))
        })
        .take(limit)
        .collect()
}

fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

fn to_listing(item: &Value, position: &str, company: &str, location: &str) -> JobListing {
    let url = str_field(item, "url").unwrap_or_default();
    let mut listing = JobListing::new(position, company, url, SourceKind::RemoteOk.name());
    listing.id = match item.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };
    listing.location = if location.trim().is_empty() {
        "Remote".to_string()
    } else {
        location.to_string()
    };
    listing.description = str_field(item, "description").unwrap_or_default().to_string();
    listing.job_type = JobType::Remote;
    listing.salary = salary_range(item);
    listing.posted_at = parse_posted_at(str_field(item, "date"));
    listing.raw = item.clone();
    listing
}

fn salary_range(item: &Value) -> Option<String> {
    let min = item.get("salary_min").and_then(Value::as_u64).filter(|v| *v > 0);
    let max = item.get("salary_max").and_then(Value::as_u64).filter(|v| *v > 0);
    match (min, max) {
        (Some(min), Some(max)) => Some(format!("${min} - ${max}")),
        (Some(min), None) => Some(format!("${min}+")),
        (None, Some(max)) => Some(format!("up to ${max}")),
        (None, None) => None,
    }
}
