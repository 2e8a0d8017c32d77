//! Indeed: paginated HTML result pages scraped with CSS selectors.
//!
//! Ten cards per page. Selectors are brittle by nature; a page that stops
//! matching simply yields no cards and ends pagination.

use async_trait::async_trait;
use scraper::Html;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::source::JobSource;
use crate::types::{ExperienceLevel, JobListing, JobType, SearchQuery, SourceKind};

use super::{child_text, collect_pages, element_text, page_count, resolve_url, selector};

const DEFAULT_BASE_URL: &str = "https://indeed.com";
const PAGE_SIZE: usize = 10;

/// Indeed job search scraper.
pub struct IndeedSource {
    base_url: String,
}

impl Default for IndeedSource {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl IndeedSource {
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
        let start = (page * PAGE_SIZE).to_string();
        let page_size = PAGE_SIZE.to_string();
        let mut params = vec![
            ("q", query.text.as_str()),
            ("l", query.location.as_str()),
            ("start", start.as_str()),
            ("limit", page_size.as_str()),
        ];
        if let Some(job_type) = query.job_type {
            params.push(("jt", job_type.as_str()));
        }

        let request = client
            .get(format!("{}/jobs", self.base_url))
            .query(&params)
            .header("Accept-Language", "en-US,en;q=0.9");
        let html = http::fetch_text(request, self.name()).await?;
        parse_indeed_html(&html, &self.base_url, query)
    }
}

#[async_trait]
impl JobSource for IndeedSource {
    fn name(&self) -> &str {
        SourceKind::Indeed.name()
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        config: &SearchConfig,
    ) -> Result<Vec<JobListing>, SearchError> {
        tracing::trace!(query = %query.text, location = %query.location, "Indeed search");

        let client = http::build_client(config)?;
        let pages = page_count(query.limit, PAGE_SIZE, config);
        collect_pages(self.name(), config, pages, query.limit, |page| {
            self.fetch_page(&client, query, page)
        })
        .await
    }
}

/// Parse one Indeed result page.
///
/// Cards without a title, company or link are skipped. Type and level echo
/// the query filters since cards do not state them.
pub(crate) fn parse_indeed_html(
    html: &str,
    base_url: &str,
    query: &SearchQuery,
) -> Result<Vec<JobListing>, SearchError> {
    let document = Html::parse_document(html);

    let card_sel = selector("div.job_seen_beacon")?;
    let title_sel = selector("h2.jobTitle")?;
    let link_sel = selector("h2.jobTitle a")?;
    let company_sel = selector("span.companyName")?;
    let location_sel = selector("div.companyLocation")?;
    let snippet_sel = selector("div.job-snippet")?;

    let mut listings = Vec::new();

    for card in document.select(&card_sel) {
        let Some(title) = child_text(card, &title_sel) else {
            continue;
        };
        let Some(company) = child_text(card, &company_sel) else {
            continue;
        };
        let Some(link) = card.select(&link_sel).next() else {
            continue;
        };
        let Some(url) = link
            .value()
            .attr("href")
            .and_then(|href| resolve_url(base_url, href))
        else {
            continue;
        };

        let mut listing = JobListing::new(title, company, url, SourceKind::Indeed.name());
        listing.id = link.value().attr("data-jk").map(str::to_string);
        listing.location =
            child_text(card, &location_sel).unwrap_or_else(|| query.location.clone());
        listing.description = child_text(card, &snippet_sel).unwrap_or_default();
        listing.job_type = query.job_type.unwrap_or(JobType::Unspecified);
        listing.experience_level = query
            .experience_level
            .unwrap_or(ExperienceLevel::Unspecified);
        listing.raw = serde_json::json!({ "card_text": element_text(card) });
        listings.push(listing);
    }

    tracing::debug!(count = listings.len(), "Indeed cards parsed");
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MOCK_INDEED_HTML: &str = r#"<!DOCTYPE html>
<html><body>
<div class="job_seen_beacon">
  <h2 class="jobTitle"><a href="/rc/clk?jk=111" data-jk="111">Rust Developer</a></h2>
  <span class="companyName">Ferrous Systems</span>
  <div class="companyLocation">Bangalore, Karnataka</div>
  <div class="job-snippet">Build async services with Tokio.</div>
</div>
<div class="job_seen_beacon">
  <h2 class="jobTitle"><a href="https://partner.example.com/apply/222">Platform Engineer</a></h2>
  <span class="companyName">Cloudy</span>
</div>
<div class="job_seen_beacon">
  <h2 class="jobTitle">No Link Role</h2>
  <span class="companyName">Ghost Inc</span>
</div>
<div class="job_seen_beacon">
  <h2 class="jobTitle"><a href="/rc/clk?jk=333">Companyless</a></h2>
</div>
</body></html>"#;

    fn quiet_config() -> SearchConfig {
        SearchConfig {
            request_delay_ms: (0, 0),
            ..Default::default()
        }
    }

    #[test]
    fn parses_complete_cards() {
        let query = SearchQuery::new("rust")
            .with_location("India")
            .with_job_type(JobType::Hybrid);
        let listings =
            parse_indeed_html(MOCK_INDEED_HTML, "https://indeed.com", &query).expect("parse");
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.title, "Rust Developer");
        assert_eq!(first.company, "Ferrous Systems");
        assert_eq!(first.url, "https://indeed.com/rc/clk?jk=111");
        assert_eq!(first.id.as_deref(), Some("111"));
        assert_eq!(first.location, "Bangalore, Karnataka");
        assert_eq!(first.description, "Build async services with Tokio.");
        assert_eq!(first.job_type, JobType::Hybrid);

        let second = &listings[1];
        assert_eq!(second.url, "https://partner.example.com/apply/222");
        assert_eq!(second.location, "India");
        assert!(second.description.is_empty());
    }

    #[test]
    fn empty_page_yields_nothing() {
        let listings = parse_indeed_html(
            "<html><body></body></html>",
            "https://indeed.com",
            &SearchQuery::new("rust"),
        )
        .expect("parse");
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn paginates_with_start_offsets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(query_param("start", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_INDEED_HTML))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(query_param("start", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let source = IndeedSource::with_base_url(server.uri());
        let query = SearchQuery::new("rust").with_limit(15);
        let listings = source.fetch(&query, &quiet_config()).await.expect("fetch");
        assert_eq!(listings.len(), 2);
        assert!(listings[0].url.starts_with(&server.uri()));
    }

    #[tokio::test]
    async fn job_type_filter_sent_as_jt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(query_param("jt", "remote"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let source = IndeedSource::with_base_url(server.uri());
        let query = SearchQuery::new("rust")
            .with_job_type(JobType::Remote)
            .with_limit(5);
        let listings = source.fetch(&query, &quiet_config()).await.expect("fetch");
        assert!(listings.is_empty());
    }
}
