//! Relevance ranking of job listings against a candidate profile.
//!
//! ```text
//! resume text ─ embed once ─┐
//!                            ├─ cosine × 100 ─ × weight ─┐
//! job description ─ embed ───┘                           ├─ match score ─ band
//! resume skills ∩ description ─ matched / n × bonus ─────┘
//! ```

pub mod ollama;
pub mod onnx;
pub mod provider;
pub mod ranker;

use std::sync::Arc;

use jobhunt_search::JobListing;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{EmbeddingBackend, EmbeddingConfig, MatchingConfig};
use crate::error::Result;

pub use ollama::OllamaEmbedder;
pub use onnx::OnnxEmbedder;
pub use provider::{EmbeddingProvider, cosine_similarity};
pub use ranker::Ranker;

/// Recommendation band. A pure function of the match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongMatch,
    GoodMatch,
    ModerateMatch,
    PoorMatch,
}

impl Recommendation {
    /// Band for `score` under the default thresholds (80 / 60 / 40).
    pub fn from_score(score: f64) -> Self {
        Self::classify(score, &MatchingConfig::default())
    }

    /// Band for `score` under the configured thresholds. Lower bounds are
    /// inclusive.
    pub fn classify(score: f64, thresholds: &MatchingConfig) -> Self {
        if score >= thresholds.strong_threshold {
            Self::StrongMatch
        } else if score >= thresholds.good_threshold {
            Self::GoodMatch
        } else if score >= thresholds.moderate_threshold {
            Self::ModerateMatch
        } else {
            Self::PoorMatch
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongMatch => "strong_match",
            Self::GoodMatch => "good_match",
            Self::ModerateMatch => "moderate_match",
            Self::PoorMatch => "poor_match",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub job: JobListing,
    /// Combined score in `[0, 100]`, two decimal places.
    pub match_score: f64,
    /// Cosine similarity scaled to `[0, 100]`, two decimal places.
    pub semantic_score: f64,
    /// Resume skills found in the description, in resume order.
    pub matched_skills: Vec<String>,
    /// Always empty for now; reserved for requirement extraction.
    pub missing_skills: Vec<String>,
    pub recommendation: Recommendation,
}

/// Construct the embedding provider selected in `config`.
///
/// The ONNX backend loads (and on first use downloads) the model; the
/// Ollama backend only builds an HTTP client.
///
/// # Errors
///
/// Returns [`crate::HuntError::Model`] if the ONNX model cannot be loaded.
pub async fn provider_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.backend {
        EmbeddingBackend::Onnx => {
            let embedder = OnnxEmbedder::load(config.model_dir.clone()).await?;
            Ok(Arc::new(embedder))
        }
        EmbeddingBackend::Ollama => {
            info!(
                "using ollama embeddings: {} ({})",
                config.ollama_base_url, config.ollama_model
            );
            Ok(Arc::new(OllamaEmbedder::from_config(config)?))
        }
    }
}
