//! Stack Overflow job pages, scraped card by card.

use async_trait::async_trait;
use scraper::Html;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::source::JobSource;
use crate::types::{ExperienceLevel, JobListing, JobType, SearchQuery, SourceKind};

use super::{
    child_text, collect_pages, element_text, page_count, resolve_url, selector, truncate_chars,
    CARD_TEXT_LIMIT,
};

const DEFAULT_BASE_URL: &str = "https://stackoverflow.com";
const PAGE_SIZE: usize = 15;

/// Stack Overflow jobs scraper.
pub struct StackOverflowSource {
    base_url: String,
}

impl Default for StackOverflowSource {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl StackOverflowSource {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_page(
        &self,
        client: &reqwest::Client,
        query: &SearchQuery,
        page: usize,
    ) -> Result<Vec<JobListing>, SearchError> {
        let page_number = (page + 1).to_string();
        let mut params = vec![("q", query.text.as_str()), ("pg", page_number.as_str())];
        if query.has_location() {
            params.push(("l", query.location.as_str()));
        }

        let request = client
            .get(format!("{}/jobs", self.base_url))
            .query(&params);
        let html = http::fetch_text(request, self.name()).await?;
        parse_stackoverflow_html(&html, &self.base_url, query)
    }
}

#[async_trait]
impl JobSource for StackOverflowSource {
    fn name(&self) -> &str {
        SourceKind::StackOverflow.name()
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        config: &SearchConfig,
    ) -> Result<Vec<JobListing>, SearchError> {
        tracing::trace!(query = %query.text, "Stack Overflow search");

        let client = http::build_client(config)?;
        let pages = page_count(query.limit, PAGE_SIZE, config);
        collect_pages(self.name(), config, pages, query.limit, |page| {
            self.fetch_page(&client, query, page)
        })
        .await
    }
}

/// Parse one Stack Overflow result page.
///
/// Only the title is mandatory. A card without a link keeps an empty URL
/// and is dropped later by deduplication.
pub(crate) fn parse_stackoverflow_html(
    html: &str,
    base_url: &str,
    query: &SearchQuery,
) -> Result<Vec<JobListing>, SearchError> {
    let document = Html::parse_document(html);

    let card_sel = selector("div.s-post-summary")?;
    let title_sel = selector("h2")?;
    let link_sel = selector("h2 a")?;
    let company_sel = selector("h3")?;
    let location_sel = selector("span.fc-black-400")?;

    let mut listings = Vec::new();

    for card in document.select(&card_sel).take(PAGE_SIZE) {
        let Some(title) = child_text(card, &title_sel) else {
            continue;
        };
        let url = card
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve_url(base_url, href))
            .unwrap_or_default();
        let company = child_text(card, &company_sel).unwrap_or_else(|| "Unknown".to_string());
        let card_text = element_text(card);

        let mut listing =
            JobListing::new(title, company, url, SourceKind::StackOverflow.name());
        listing.location =
            child_text(card, &location_sel).unwrap_or_else(|| query.location.clone());
        listing.job_type = JobType::infer_from_text(&card_text);
        listing.experience_level = query
            .experience_level
            .unwrap_or(ExperienceLevel::Unspecified);
        listing.description = truncate_chars(&card_text, CARD_TEXT_LIMIT);
        listing.raw = serde_json::json!({ "card_text": card_text });
        listings.push(listing);
    }

    tracing::debug!(count = listings.len(), "Stack Overflow cards parsed");
    Ok(listings)
}
