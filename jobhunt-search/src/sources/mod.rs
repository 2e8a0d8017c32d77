//! Job source implementations.
//!
//! Each module provides a struct implementing [`crate::source::JobSource`]
//! for one upstream. Shared parsing and pagination helpers live here.

pub mod github;
pub mod indeed;
pub mod linkedin;
pub mod remoteok;
pub mod stackoverflow;

pub use github::GitHubJobsSource;
pub use indeed::IndeedSource;
pub use linkedin::LinkedInSource;
pub use remoteok::RemoteOkSource;
pub use stackoverflow::StackOverflowSource;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use scraper::{ElementRef, Selector};
use url::Url;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::source::JobSource;
use crate::types::{JobListing, SourceKind};

/// Card text kept as the description when a source has no dedicated snippet.
pub(crate) const CARD_TEXT_LIMIT: usize = 500;

/// Instantiate the built-in source for `kind` against its public endpoint.
pub fn build_source(kind: SourceKind) -> Arc<dyn JobSource> {
    match kind {
        SourceKind::GitHubJobs => Arc::new(GitHubJobsSource::default()),
        SourceKind::Indeed => Arc::new(IndeedSource::default()),
        SourceKind::StackOverflow => Arc::new(StackOverflowSource::default()),
        SourceKind::LinkedIn => Arc::new(LinkedInSource::default()),
        SourceKind::RemoteOk => Arc::new(RemoteOkSource::default()),
    }
}

/// Instantiate every source enabled in `config`, in configured order.
pub fn sources_from_config(config: &SearchConfig) -> Vec<Arc<dyn JobSource>> {
    config.sources.iter().map(|kind| build_source(*kind)).collect()
}

/// Parse a CSS selector, mapping failure to [`SearchError::Parse`].
pub(crate) fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("invalid selector {css:?}: {e:?}")))
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first descendant matching `sel`, if present and non-empty.
pub(crate) fn child_text(element: ElementRef<'_>, sel: &Selector) -> Option<String> {
    element
        .select(sel)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Truncate to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Resolve a possibly relative `href` against the source base URL.
pub(crate) fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

/// Parse the timestamp formats job sources publish, falling back to now.
pub(crate) fn parse_posted_at(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Utc::now();
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }
    // GitHub Jobs style: "Mon Jun 01 12:00:00 UTC 2020"
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%a %b %d %H:%M:%S UTC %Y") {
        return parsed.and_utc();
    }
    tracing::trace!(raw, "unrecognised posted date, using discovery time");
    Utc::now()
}

/// Number of result pages to request for `limit` at `page_size` per page,
/// capped by the configured maximum.
pub(crate) fn page_count(limit: usize, page_size: usize, config: &SearchConfig) -> usize {
    (limit / page_size.max(1) + 1).min(config.max_pages)
}

/// Fetch up to `pages` pages sequentially with a politeness delay between
/// them.
///
/// A failing page is logged and skipped. Pagination stops early once
/// `limit` listings are collected or a page comes back empty. If nothing
/// was collected and some page failed, the last error is returned.
pub(crate) async fn collect_pages<F, Fut>(
    source: &str,
    config: &SearchConfig,
    pages: usize,
    limit: usize,
    mut fetch_page: F,
) -> Result<Vec<JobListing>, SearchError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<JobListing>, SearchError>>,
{
    let mut listings: Vec<JobListing> = Vec::new();
    let mut last_error: Option<SearchError> = None;

    for page in 0..pages {
        if page > 0 {
            http::pause_between_pages(config).await;
        }
        match fetch_page(page).await {
            Ok(batch) if batch.is_empty() => {
                tracing::debug!(source, page, "no more results");
                break;
            }
            Ok(batch) => {
                tracing::debug!(source, page, count = batch.len(), "page parsed");
                listings.extend(batch);
                if listings.len() >= limit {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(source, page, error = %err, "page fetch failed");
                last_error = Some(err);
            }
        }
    }

    if listings.is_empty() {
        if let Some(err) = last_error {
            return Err(err);
        }
    }

    listings.truncate(limit);
    Ok(listings)
}
