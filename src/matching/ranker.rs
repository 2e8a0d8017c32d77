//! Scores listings against a resume and orders them by relevance.

use std::sync::Arc;

use jobhunt_search::JobListing;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::provider::{EmbeddingProvider, cosine_similarity};
use super::{MatchResult, Recommendation};
use crate::config::MatchingConfig;
use crate::error::Result;

/// Relevance ranking engine. Holds one shared embedding provider.
pub struct Ranker {
    embedder: Arc<dyn EmbeddingProvider>,
    weights: MatchingConfig,
}

impl Ranker {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, weights: MatchingConfig) -> Self {
        Self { embedder, weights }
    }

    /// Rank `jobs` against a resume, best first.
    ///
    /// The resume is embedded once and each description once. Equal scores
    /// keep their input order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::HuntError::EmbeddingUnavailable`] if any embedding
    /// fails; no partial ranking is returned in that case.
    pub async fn rank(
        &self,
        resume_text: &str,
        resume_skills: &[String],
        jobs: Vec<JobListing>,
    ) -> Result<Vec<MatchResult>> {
        self.rank_until(resume_text, resume_skills, jobs, None).await
    }

    /// Like [`rank`](Self::rank), but stops at `deadline` and returns the
    /// listings scored so far, still sorted.
    pub async fn rank_until(
        &self,
        resume_text: &str,
        resume_skills: &[String],
        jobs: Vec<JobListing>,
        deadline: Option<Instant>,
    ) -> Result<Vec<MatchResult>> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let total = jobs.len();
        let Some(resume_vector) = self.embed_before(resume_text, deadline).await? else {
            warn!(total, "ranking deadline expired before the resume was embedded");
            return Ok(Vec::new());
        };

        let mut results = Vec::with_capacity(total);
        for job in jobs {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(scored = results.len(), total, "ranking deadline expired");
                break;
            }
            let Some(job_vector) = self.embed_before(&job.description, deadline).await? else {
                warn!(scored = results.len(), total, "ranking deadline expired");
                break;
            };
            let similarity = cosine_similarity(&resume_vector, &job_vector)?;
            results.push(self.score(job, similarity, resume_skills));
        }

        results.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        debug!(
            ranked = results.len(),
            embedder = self.embedder.name(),
            "ranking complete"
        );
        Ok(results)
    }

    async fn embed_before(&self, text: &str, deadline: Option<Instant>) -> Result<Option<Vec<f32>>> {
        match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, self.embedder.embed(text)).await {
                Ok(vector) => vector.map(Some),
                Err(_) => Ok(None),
            },
            None => self.embedder.embed(text).await.map(Some),
        }
    }

    fn score(&self, job: JobListing, similarity: f32, resume_skills: &[String]) -> MatchResult {
        let matched_skills = matched_skills(&job.description, resume_skills);
        let semantic = (f64::from(similarity) * 100.0).clamp(0.0, 100.0);
        let bonus = matched_skills.len() as f64 / resume_skills.len().max(1) as f64
            * self.weights.skill_bonus;
        let match_score = round2((semantic * self.weights.semantic_weight + bonus).min(100.0));

        MatchResult {
            job,
            match_score,
            semantic_score: round2(semantic),
            matched_skills,
            missing_skills: Vec::new(),
            recommendation: Recommendation::classify(match_score, &self.weights),
        }
    }
}

/// Resume skills whose lowercase form occurs in the lowercase description,
/// in resume order. Blank skills never match.
pub fn matched_skills(description: &str, resume_skills: &[String]) -> Vec<String> {
    let haystack = description.to_lowercase();
    let mut matched: Vec<String> = Vec::new();
    for skill in resume_skills {
        let needle = skill.trim().to_lowercase();
        if needle.is_empty() || !haystack.contains(&needle) {
            continue;
        }
        if matched.iter().any(|m| m.to_lowercase() == needle) {
            continue;
        }
        matched.push(skill.clone());
    }
    matched
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
