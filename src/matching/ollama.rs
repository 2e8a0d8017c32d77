//! Embeddings from a running Ollama server.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::provider::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::{HuntError, Result};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// [`EmbeddingProvider`] calling `POST {base_url}/api/embeddings`.
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// # Errors
    ///
    /// Returns [`HuntError::Config`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HuntError::Config(format!("failed to build HTTP client: {e}")))?;
        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: model.into(),
            client,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::new(
            config.ollama_base_url.clone(),
            config.ollama_model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| HuntError::EmbeddingUnavailable(format!("ollama request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail: String = body.chars().take(200).collect();
            return Err(HuntError::EmbeddingUnavailable(format!(
                "ollama returned HTTP {}: {detail}",
                status.as_u16()
            )));
        }

        let parsed: EmbeddingResponse = resp.json().await.map_err(|e| {
            HuntError::EmbeddingUnavailable(format!("invalid ollama response: {e}"))
        })?;
        if parsed.embedding.is_empty() {
            return Err(HuntError::EmbeddingUnavailable(
                "ollama returned an empty embedding".into(),
            ));
        }
        trace!(dim = parsed.embedding.len(), "ollama embedding received");
        Ok(parsed.embedding)
    }
}
