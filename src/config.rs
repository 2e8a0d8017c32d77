//! Configuration for jobhunt.
//!
//! Loaded from TOML. Every section has defaults, so an empty file (or no
//! file) is a valid configuration.

use std::path::{Path, PathBuf};

use jobhunt_search::{DEFAULT_LIMIT, SearchConfig};
use serde::{Deserialize, Serialize};

use crate::error::{HuntError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntConfig {
    /// Sources, timeouts, politeness, cache and circuit breaker.
    pub search: SearchConfig,
    /// Defaults applied to queries that leave them unset.
    pub query: QueryDefaults,
    /// Ranking weights and band thresholds.
    pub matching: MatchingConfig,
    /// Embedding backend selection.
    pub embedding: EmbeddingConfig,
    /// Listing persistence.
    pub storage: StorageConfig,
}

/// Query defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    /// Location used when a query gives none. Empty means no filter.
    pub location: String,
    /// Result budget used when a query gives none.
    pub limit: usize,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            location: String::new(),
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Weights of the match score and the thresholds of its bands.
///
/// `match_score = min(100, semantic_score * semantic_weight + matched / skills * skill_bonus)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub semantic_weight: f64,
    /// Bonus awarded when every resume skill appears in the description.
    pub skill_bonus: f64,
    pub strong_threshold: f64,
    pub good_threshold: f64,
    pub moderate_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.7,
            skill_bonus: 30.0,
            strong_threshold: 80.0,
            good_threshold: 60.0,
            moderate_threshold: 40.0,
        }
    }
}

impl MatchingConfig {
    /// Checks:
    /// - `semantic_weight` within `[0, 1]`
    /// - `skill_bonus` non-negative
    /// - thresholds within `(0, 100]` and strictly decreasing
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.semantic_weight) {
            return Err(HuntError::Config(
                "matching.semantic_weight must be within [0, 1]".into(),
            ));
        }
        if !(self.skill_bonus >= 0.0) {
            return Err(HuntError::Config(
                "matching.skill_bonus must be non-negative".into(),
            ));
        }
        let thresholds = [
            self.strong_threshold,
            self.good_threshold,
            self.moderate_threshold,
        ];
        if thresholds.iter().any(|t| !(*t > 0.0 && *t <= 100.0)) {
            return Err(HuntError::Config(
                "matching thresholds must be within (0, 100]".into(),
            ));
        }
        if !(self.strong_threshold > self.good_threshold
            && self.good_threshold > self.moderate_threshold)
        {
            return Err(HuntError::Config(
                "matching thresholds must be strictly decreasing (strong > good > moderate)"
                    .into(),
            ));
        }
        Ok(())
    }
}

/// Which embedding implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX Runtime inference.
    #[default]
    Onnx,
    /// A running Ollama server.
    Ollama,
}

/// Embedding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Directory holding `model.onnx` and `tokenizer.json`. When unset the
    /// model is downloaded from HuggingFace Hub.
    pub model_dir: Option<PathBuf>,
    pub ollama_base_url: String,
    pub ollama_model: String,
    /// Per-request timeout for the Ollama backend.
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model_dir: None,
            ollama_base_url: "http://localhost:11434".into(),
            ollama_model: "all-minilm".into(),
            request_timeout_secs: 30,
        }
    }
}

/// Listing persistence. With no path, listings are not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub sqlite_path: Option<PathBuf>,
}

impl HuntConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| HuntError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Serialise as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| HuntError::Config(e.to_string()))
    }

    /// Returns the default config file path: `~/.config/jobhunt/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("jobhunt").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("jobhunt")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/jobhunt-config/config.toml")
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.matching.validate()?;
        if self.query.limit == 0 {
            return Err(HuntError::Config(
                "query.limit must be greater than 0".into(),
            ));
        }
        if self.embedding.backend == EmbeddingBackend::Ollama {
            if self.embedding.ollama_base_url.trim().is_empty() {
                return Err(HuntError::Config(
                    "embedding.ollama_base_url must be set for the ollama backend".into(),
                ));
            }
            if self.embedding.ollama_model.trim().is_empty() {
                return Err(HuntError::Config(
                    "embedding.ollama_model must be set for the ollama backend".into(),
                ));
            }
        }
        Ok(())
    }
}
