//! Error types for the jobhunt-search crate.
//!
//! Only [`SearchError::InvalidQuery`] and [`SearchError::Config`] ever leave
//! the aggregator. The transport variants describe why a single source was
//! unavailable; the aggregator logs them and carries on with the other sources.

/// Errors that can occur while aggregating job listings.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The query was rejected before any source was contacted.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A source did not answer within its time budget.
    #[error("source timed out: {0}")]
    Timeout(String),

    /// An HTTP request to a source failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A source response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for jobhunt-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
