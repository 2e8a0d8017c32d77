//! Core types for job listings, search queries, and source identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// Default result budget when the caller does not pick one.
pub const DEFAULT_LIMIT: usize = 50;

/// A single job posting, normalised from whichever source discovered it.
///
/// Listings are created fresh per search call and never mutated by the
/// aggregator after they leave the source that built them (apart from the
/// one-time identifier assignment in [`crate::orchestrator::search`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    /// Stable identifier. Source-provided when the upstream exposes one,
    /// otherwise a locally generated UUID.
    pub id: Option<String>,
    /// Position title.
    pub title: String,
    /// Hiring company.
    pub company: String,
    /// Free-form location as reported by the source.
    pub location: String,
    /// Job description or card text.
    pub description: String,
    /// Canonical URL. The sole identity key for deduplication.
    pub url: String,
    /// Name of the source that produced this listing (see [`SourceKind::name`]).
    pub source: String,
    /// Working arrangement.
    pub job_type: JobType,
    /// Seniority band.
    pub experience_level: ExperienceLevel,
    /// Salary text, when the source publishes one.
    pub salary: Option<String>,
    /// When the posting was published; discovery time if unknown.
    pub posted_at: DateTime<Utc>,
    /// Raw upstream payload, kept for traceability.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl JobListing {
    /// Create a listing with the required fields; everything else defaults
    /// (unspecified type and level, no salary, posted now, null payload).
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            company: company.into(),
            location: String::new(),
            description: String::new(),
            url: url.into(),
            source: source.into(),
            job_type: JobType::Unspecified,
            experience_level: ExperienceLevel::Unspecified,
            salary: None,
            posted_at: Utc::now(),
            raw: serde_json::Value::Null,
        }
    }
}

/// Working arrangement of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "remote")]
    Remote,
    #[serde(rename = "hybrid")]
    Hybrid,
    #[serde(rename = "on-site")]
    OnSite,
    #[default]
    #[serde(rename = "not specified")]
    Unspecified,
}

impl JobType {
    /// Wire name, also used as the filter value sent to sources.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Hybrid => "hybrid",
            Self::OnSite => "on-site",
            Self::Unspecified => "not specified",
        }
    }

    /// Infer remote vs on-site from free text, the way card-based sources
    /// report it.
    pub fn infer_from_text(text: &str) -> Self {
        if text.to_lowercase().contains("remote") {
            Self::Remote
        } else {
            Self::OnSite
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "hybrid" => Ok(Self::Hybrid),
            "on-site" | "onsite" | "on site" | "office" => Ok(Self::OnSite),
            "" | "not specified" | "any" => Ok(Self::Unspecified),
            other => Err(SearchError::InvalidQuery(format!(
                "unknown job type: {other}"
            ))),
        }
    }
}

/// Seniority band of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[serde(rename = "entry")]
    Entry,
    #[serde(rename = "mid")]
    Mid,
    #[serde(rename = "senior")]
    Senior,
    #[default]
    #[serde(rename = "not specified")]
    Unspecified,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Mid => "mid",
            Self::Senior => "senior",
            Self::Unspecified => "not specified",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" | "junior" | "entry-level" | "entry level" => Ok(Self::Entry),
            "mid" | "intermediate" | "mid-level" | "mid level" => Ok(Self::Mid),
            "senior" | "lead" | "staff" => Ok(Self::Senior),
            "" | "not specified" | "any" => Ok(Self::Unspecified),
            other => Err(SearchError::InvalidQuery(format!(
                "unknown experience level: {other}"
            ))),
        }
    }
}

/// Upstream job sources known to jobhunt-search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// GitHub Jobs JSON API; filters server-side.
    #[serde(rename = "github")]
    GitHubJobs,
    /// Indeed search result pages.
    Indeed,
    /// Stack Overflow job pages.
    #[serde(rename = "stackoverflow")]
    StackOverflow,
    /// LinkedIn guest job search.
    LinkedIn,
    /// RemoteOK public JSON feed; filters client-side.
    #[serde(rename = "remoteok")]
    RemoteOk,
}

impl SourceKind {
    /// Stable source identifier stored on every listing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GitHubJobs => "github",
            Self::Indeed => "indeed",
            Self::StackOverflow => "stackoverflow",
            Self::LinkedIn => "linkedin",
            Self::RemoteOk => "remoteok",
        }
    }

    /// Returns all available source variants.
    pub fn all() -> &'static [SourceKind] {
        &[
            Self::GitHubJobs,
            Self::StackOverflow,
            Self::Indeed,
            Self::LinkedIn,
            Self::RemoteOk,
        ]
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| SearchError::Config(format!("unknown source: {s}")))
    }
}

/// A job search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query, e.g. `"ml engineer"`.
    pub text: String,
    /// Location filter. Empty means no filter.
    #[serde(default)]
    pub location: String,
    /// Optional working-arrangement filter.
    #[serde(default)]
    pub job_type: Option<JobType>,
    /// Optional seniority filter.
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    /// Result budget, must be positive.
    pub limit: usize,
}

impl SearchQuery {
    /// Build a query with no filters and the default limit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            location: String::new(),
            job_type: None,
            experience_level: None,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_job_type(mut self, job_type: JobType) -> Self {
        self.job_type = Some(job_type);
        self
    }

    pub fn with_experience_level(mut self, level: ExperienceLevel) -> Self {
        self.experience_level = Some(level);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether a location filter is set.
    pub fn has_location(&self) -> bool {
        !self.location.trim().is_empty()
    }

    /// Rejects queries that must never reach a source.
    ///
    /// Checks:
    /// - `limit` must be greater than 0
    /// - query text and location must not contain control characters
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.limit == 0 {
            return Err(SearchError::InvalidQuery(
                "limit must be greater than 0".into(),
            ));
        }
        if self.text.chars().any(char::is_control) {
            return Err(SearchError::InvalidQuery(
                "query text contains control characters".into(),
            ));
        }
        if self.location.chars().any(char::is_control) {
            return Err(SearchError::InvalidQuery(
                "location contains control characters".into(),
            ));
        }
        Ok(())
    }
}
