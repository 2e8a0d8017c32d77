//! Error types for jobhunt.

use jobhunt_search::SearchError;

/// Top-level error type for search, ranking and persistence.
#[derive(Debug, thiserror::Error)]
pub enum HuntError {
    /// The embedding provider could not produce a vector. Fatal for the
    /// ranking call that hit it.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Model download or loading error.
    #[error("model error: {0}")]
    Model(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Job store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Rejected query or search configuration.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for HuntError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, HuntError>;
