//! GitHub Jobs: a JSON job board that filters server-side.
//!
//! The query text is sent as `description` and the location as `location`;
//! the board returns a JSON array of positions already filtered.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::source::JobSource;
use crate::types::{ExperienceLevel, JobListing, JobType, SearchQuery, SourceKind};

use super::parse_posted_at;

const DEFAULT_BASE_URL: &str = "https://jobs.github.com";

/// GitHub Jobs positions API.
pub struct GitHubJobsSource {
    base_url: String,
}

impl Default for GitHubJobsSource {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl GitHubJobsSource {
    /// Point the source at a different host (mirrors, tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Position {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    created_at: Option<String>,
}

#[async_trait]
impl JobSource for GitHubJobsSource {
    fn name(&self) -> &str {
        SourceKind::GitHubJobs.name()
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        config: &SearchConfig,
    ) -> Result<Vec<JobListing>, SearchError> {
        tracing::trace!(query = %query.text, "GitHub Jobs search");

        let client = http::build_client(config)?;
        let mut params = vec![("description", query.text.as_str()), ("full_time", "true")];
        if query.has_location() {
            params.push(("location", query.location.as_str()));
        }

        let request = client
            .get(format!("{}/positions.json", self.base_url))
            .query(&params);
        let body = http::fetch_text(request, self.name()).await?;

        parse_positions(&body, query)
    }
}

/// Parse the positions JSON array into listings.
///
/// Extracted as a separate function for testability with canned JSON.
pub(crate) fn parse_positions(
    body: &str,
    query: &SearchQuery,
) -> Result<Vec<JobListing>, SearchError> {
    let items: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| SearchError::Parse(format!("GitHub Jobs response is not a JSON array: {e}")))?;

    let mut listings = Vec::new();
    for item in items.into_iter().take(query.limit) {
        let position: Position = match serde_json::from_value(item.clone()) {
            Ok(p) => p,
            Err(err) => {
                tracing::debug!(error = %err, "skipping malformed GitHub Jobs position");
                continue;
            }
        };

        listings.push(JobListing {
            id: position.id.filter(|id| !id.is_empty()),
            job_type: JobType::infer_from_text(&position.description),
            experience_level: ExperienceLevel::Unspecified,
            location: position
                .location
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| query.location.clone()),
            posted_at: parse_posted_at(position.created_at.as_deref()),
            salary: None,
            title: position.title,
            company: position.company,
            description: position.description,
            url: position.url,
            source: SourceKind::GitHubJobs.name().to_string(),
            raw: item,
        });
    }

    tracing::debug!(count = listings.len(), "GitHub Jobs positions parsed");
    Ok(listings)
}
