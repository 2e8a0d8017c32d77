//! jobhunt: job discovery across unreliable sources with embedding-based
//! relevance ranking.
//!
//! # Architecture
//!
//! - **Aggregation** ([`jobhunt_search`]): source adapters fan out
//!   concurrently, failures are isolated per source, results are
//!   deduplicated by canonical URL
//! - **Ranking** ([`matching`]): resume and descriptions are embedded
//!   (local ONNX model or Ollama), scored by cosine similarity plus a skill
//!   bonus, and banded
//! - **Persistence** ([`store`]): new listings are saved by URL
//! - **Facade** ([`JobHunter`]): search, persist, rank

pub mod config;
pub mod error;
pub mod hunter;
pub mod matching;
pub mod profile;
pub mod store;

pub use config::HuntConfig;
pub use error::{HuntError, Result};
pub use hunter::JobHunter;
pub use matching::{EmbeddingProvider, MatchResult, Ranker, Recommendation};
pub use profile::CandidateProfile;
pub use store::{InMemoryJobStore, JobStore, SqliteJobStore};

pub use jobhunt_search::{ExperienceLevel, JobListing, JobType, SearchQuery};
