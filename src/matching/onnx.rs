//! Local sentence embeddings via ONNX Runtime.
//!
//! Uses `all-MiniLM-L6-v2` (384-dim). The model is downloaded from
//! HuggingFace Hub on first use and cached by `hf-hub`, unless a local
//! model directory is configured.
//!
//! # Pipeline
//!
//! ```text
//! text → tokenizer → ONNX model → mean-pool → L2-normalize → 384-dim f32
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::{Session, SessionInputValue, SessionInputs};
use ort::value::Tensor;
use tracing::info;

use super::provider::EmbeddingProvider;
use crate::error::{HuntError, Result};

/// HuggingFace repo for the all-MiniLM-L6-v2 ONNX model.
const REPO_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// ONNX model filename inside the repo.
const MODEL_FILE: &str = "onnx/model.onnx";

/// Tokenizer filename inside the repo.
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Output embedding dimensions.
pub const EMBEDDING_DIM: usize = 384;

/// Maximum token sequence length for the model. Job descriptions are
/// routinely longer; the tail is truncated.
const MAX_TOKENS: usize = 256;

struct Engine {
    session: Session,
    tokenizer: tokenizers::Tokenizer,
}

impl Engine {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| unavailable(format!("tokenization failed: {e}")))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        let seq_len = input_ids.len();

        let ids_tensor = Tensor::from_array(([1, seq_len], input_ids))
            .map_err(|e| unavailable(format!("failed to create input_ids tensor: {e}")))?;
        let mask_tensor = Tensor::from_array(([1, seq_len], attention_mask.clone()))
            .map_err(|e| unavailable(format!("failed to create attention_mask tensor: {e}")))?;
        let type_tensor = Tensor::from_array(([1, seq_len], token_type_ids))
            .map_err(|e| unavailable(format!("failed to create token_type_ids tensor: {e}")))?;

        let mut feed: HashMap<String, SessionInputValue> = HashMap::new();
        feed.insert("input_ids".to_owned(), ids_tensor.into());
        feed.insert("attention_mask".to_owned(), mask_tensor.into());
        feed.insert("token_type_ids".to_owned(), type_tensor.into());

        let outputs = self
            .session
            .run(SessionInputs::from(feed))
            .map_err(|e| unavailable(format!("ONNX inference failed: {e}")))?;

        // Output shape: [1, seq_len, 384], token-level embeddings.
        let (_shape, data) = outputs[0_usize]
            .try_extract_tensor::<f32>()
            .map_err(|e| unavailable(format!("failed to extract output tensor: {e}")))?;

        let pooled = mean_pool(data, &attention_mask, EMBEDDING_DIM);
        Ok(l2_normalize(&pooled))
    }
}

fn unavailable(msg: String) -> HuntError {
    HuntError::EmbeddingUnavailable(msg)
}

/// [`EmbeddingProvider`] backed by a local `all-MiniLM-L6-v2` session.
///
/// The tokenizer and session need exclusive access, so inference is
/// serialised behind a mutex and run on the blocking thread pool.
#[derive(Clone)]
pub struct OnnxEmbedder {
    engine: Arc<Mutex<Engine>>,
}

impl std::fmt::Debug for OnnxEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbedder")
            .field("dim", &EMBEDDING_DIM)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbedder {
    /// Load from pre-downloaded model files.
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::Model`] if the ONNX model or tokenizer cannot be loaded.
    pub fn new(model_path: &Path, tokenizer_path: &Path) -> Result<Self> {
        info!("loading embedding ONNX model: {}", model_path.display());
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(2))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| HuntError::Model(format!("embedding model load failed: {e}")))?;

        info!("loading embedding tokenizer: {}", tokenizer_path.display());
        let mut tokenizer = tokenizers::Tokenizer::from_file(tokenizer_path)
            .map_err(|e| HuntError::Model(format!("embedding tokenizer load failed: {e}")))?;

        let truncation = tokenizers::TruncationParams {
            max_length: MAX_TOKENS,
            ..Default::default()
        };
        tokenizer
            .with_truncation(Some(truncation))
            .map_err(|e| HuntError::Model(format!("tokenizer truncation config failed: {e}")))?;
        tokenizer.with_padding(None);

        info!("embedding engine ready (dim={EMBEDDING_DIM})");

        Ok(Self {
            engine: Arc::new(Mutex::new(Engine { session, tokenizer })),
        })
    }

    /// Download the model files from HuggingFace Hub.
    ///
    /// Returns `(model_path, tokenizer_path)`. Blocking.
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::Model`] if the download fails.
    pub fn download_model() -> Result<(PathBuf, PathBuf)> {
        info!("downloading embedding model: {REPO_ID}");
        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| HuntError::Model(format!("HF Hub API init failed: {e}")))?;
        let repo = api.model(REPO_ID.to_owned());

        let model_path = repo
            .get(MODEL_FILE)
            .map_err(|e| HuntError::Model(format!("failed to download {MODEL_FILE}: {e}")))?;
        let tokenizer_path = repo
            .get(TOKENIZER_FILE)
            .map_err(|e| HuntError::Model(format!("failed to download {TOKENIZER_FILE}: {e}")))?;

        Ok((model_path, tokenizer_path))
    }

    /// Load from `model_dir` (expects `model.onnx` and `tokenizer.json`), or
    /// download from the Hub when `None`. Runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::Model`] if download or loading fails.
    pub async fn load(model_dir: Option<PathBuf>) -> Result<Self> {
        tokio::task::spawn_blocking(move || {
            let (model_path, tokenizer_path) = match model_dir {
                Some(dir) => (dir.join("model.onnx"), dir.join(TOKENIZER_FILE)),
                None => Self::download_model()?,
            };
            Self::new(&model_path, &tokenizer_path)
        })
        .await
        .map_err(|e| HuntError::Model(format!("model loading task failed: {e}")))?
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    fn name(&self) -> &str {
        "onnx"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let engine = Arc::clone(&self.engine);
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || {
            let mut engine = engine.lock().unwrap_or_else(|p| p.into_inner());
            engine.embed(&text)
        })
        .await
        .map_err(|e| unavailable(format!("embedding task failed: {e}")))?
    }
}

/// Mean-pool token embeddings using the attention mask.
///
/// `flat` is shape `[mask.len(), dim]` stored row-major.
fn mean_pool(flat: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut count = 0.0f32;

    for (t, &m) in mask.iter().enumerate() {
        if m != 0 {
            let offset = t * dim;
            for (p, &f) in pooled.iter_mut().zip(&flat[offset..offset + dim]) {
                *p += f;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for p in &mut pooled {
            *p /= count;
        }
    }

    pooled
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm < 1e-12 {
        return vec.to_vec();
    }
    vec.iter().map(|x| x / norm).collect()
}
