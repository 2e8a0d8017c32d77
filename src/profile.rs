//! Candidate profile consumed by ranking.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HuntError, Result};

/// Resume summary plus an ordered technical skill list. Read-only input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub summary: String,
    #[serde(default, alias = "skills")]
    pub technical_skills: Vec<String>,
}

impl CandidateProfile {
    pub fn new(summary: impl Into<String>, technical_skills: Vec<String>) -> Self {
        Self {
            summary: summary.into(),
            technical_skills,
        }
    }

    /// Text embedded as the resume side of every comparison:
    /// `summary + " " + skills.join(" ")`.
    pub fn resume_text(&self) -> String {
        format!("{} {}", self.summary, self.technical_skills.join(" "))
    }

    /// Load a profile from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::Io`] if the file cannot be read and
    /// [`HuntError::Config`] if it is not a valid profile.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| HuntError::Config(format!("invalid profile {}: {e}", path.display())))
    }
}
