//! LinkedIn public job search.
//!
//! Two passes: the guest "see more postings" endpoint first, then the
//! public search page when the guest endpoint returns fewer than half the
//! requested listings. LinkedIn blocks aggressively, so both passes failing
//! is the common case and surfaces as an unavailable source.

use async_trait::async_trait;
use scraper::Html;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::source::JobSource;
use crate::types::{JobListing, SearchQuery, SourceKind};

use super::{child_text, element_text, selector, truncate_chars, CARD_TEXT_LIMIT};

const DEFAULT_BASE_URL: &str = "https://www.linkedin.com";
const GUEST_PAGE_SIZE: usize = 25;

/// LinkedIn guest job search scraper.
pub struct LinkedInSource {
    base_url: String,
}

impl Default for LinkedInSource {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl LinkedInSource {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_guest(
        &self,
        client: &reqwest::Client,
        query: &SearchQuery,
    ) -> Result<Vec<JobListing>, SearchError> {
        let count = query.limit.min(GUEST_PAGE_SIZE).to_string();
        let params = [
            ("keywords", query.text.as_str()),
            ("location", query.location.as_str()),
            ("start", "0"),
            ("count", count.as_str()),
            ("sortBy", "DD"),
        ];
        let request = client
            .get(format!(
                "{}/jobs-guest/jobs/api/seeMoreJobPostings/search",
                self.base_url
            ))
            .query(&params);
        let html = http::fetch_text(request, self.name()).await?;
        parse_guest_cards(&html, query)
    }

    async fn fetch_search_page(
        &self,
        client: &reqwest::Client,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<JobListing>, SearchError> {
        let params = [
            ("keywords", query.text.as_str()),
            ("location", query.location.as_str()),
            ("sortBy", "DD"),
        ];
        let request = client
            .get(format!("{}/jobs/search", self.base_url))
            .query(&params);
        let html = http::fetch_text(request, self.name()).await?;
        parse_search_page(&html, &self.base_url, query, limit)
    }
}

#[async_trait]
impl JobSource for LinkedInSource {
    fn name(&self) -> &str {
        SourceKind::LinkedIn.name()
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        config: &SearchConfig,
    ) -> Result<Vec<JobListing>, SearchError> {
        tracing::trace!(query = %query.text, location = %query.location, "LinkedIn search");

        let client = http::build_client(config)?;

        let (mut listings, guest_error) = match self.fetch_guest(&client, query).await {
            Ok(listings) => (listings, None),
            Err(err) => {
                tracing::warn!(source = self.name(), error = %err, "guest endpoint failed");
                (Vec::new(), Some(err))
            }
        };

        if listings.len() < query.limit / 2 || listings.is_empty() {
            tracing::debug!(
                source = self.name(),
                found = listings.len(),
                "falling back to public search page"
            );
            http::pause_between_pages(config).await;
            let remaining = query.limit.saturating_sub(listings.len());
            match self.fetch_search_page(&client, query, remaining).await {
                Ok(more) => listings.extend(more),
                Err(err) => {
                    tracing::warn!(source = self.name(), error = %err, "search page failed");
                    if listings.is_empty() {
                        return Err(guest_error.unwrap_or(err));
                    }
                }
            }
        }

        listings.truncate(query.limit);
        Ok(listings)
    }
}

/// Parse guest endpoint cards (`div.base-card`).
pub(crate) fn parse_guest_cards(
    html: &str,
    query: &SearchQuery,
) -> Result<Vec<JobListing>, SearchError> {
    let document = Html::parse_document(html);

    let card_sel = selector("div.base-card")?;
    let title_sel = selector("h3.base-search-card__title")?;
    let company_sel = selector("h4.base-search-card__subtitle")?;
    let location_sel = selector("span.job-search-card__location")?;
    let link_sel = selector("a.base-card__full-link")?;

    let mut listings = Vec::new();

    for card in document.select(&card_sel).take(query.limit) {
        let (Some(title), Some(company)) =
            (child_text(card, &title_sel), child_text(card, &company_sel))
        else {
            continue;
        };
        let url = card
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| href.trim().to_string())
            .unwrap_or_default();
        let card_text = element_text(card);

        let mut listing = JobListing::new(title, company, url, SourceKind::LinkedIn.name());
        // "urn:li:jobPosting:3812345678"
        listing.id = card
            .value()
            .attr("data-entity-urn")
            .and_then(|urn| urn.rsplit(':').next())
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        listing.location =
            child_text(card, &location_sel).unwrap_or_else(|| query.location.clone());
        listing.description = truncate_chars(&card_text, CARD_TEXT_LIMIT);
        listing.raw = serde_json::json!({ "card_text": card_text, "endpoint": "guest" });
        listings.push(listing);
    }

    tracing::debug!(count = listings.len(), "LinkedIn guest cards parsed");
    Ok(listings)
}

/// Parse the public search page (`div[data-job-id]`).
pub(crate) fn parse_search_page(
    html: &str,
    base_url: &str,
    query: &SearchQuery,
    limit: usize,
) -> Result<Vec<JobListing>, SearchError> {
    let document = Html::parse_document(html);

    let card_sel = selector("div[data-job-id]")?;
    let title_sel = selector("h3")?;
    let company_sel = selector("h4")?;

    let mut listings = Vec::new();

    for card in document.select(&card_sel).take(limit) {
        let (Some(title), Some(company)) =
            (child_text(card, &title_sel), child_text(card, &company_sel))
        else {
            continue;
        };
        let job_id = card
            .value()
            .attr("data-job-id")
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let url = job_id
            .map(|id| format!("{base_url}/jobs/view/{id}"))
            .unwrap_or_default();
        let card_text = element_text(card);

        let mut listing = JobListing::new(title, company, url, SourceKind::LinkedIn.name());
        listing.id = job_id.map(str::to_string);
        listing.location = query.location.clone();
        listing.description = truncate_chars(&card_text, CARD_TEXT_LIMIT);
        listing.raw = serde_json::json!({ "card_text": card_text, "endpoint": "search" });
        listings.push(listing);
    }

    tracing::debug!(count = listings.len(), "LinkedIn search page parsed");
    Ok(listings)
}
