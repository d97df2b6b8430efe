// Local sentence embeddings via Candle
use anyhow::{Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};

use crate::rag::collaborators::Embedder;

/// Model used to index the health corpus
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Longest token sequence the BERT position table accepts
const MAX_SEQUENCE_LENGTH: usize = 512;

/// Sentence embedding engine (BERT + mean pooling + L2 normalization)
#[derive(Clone)]
pub struct EmbeddingEngine {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    dimension: usize,
    model_id: String,
}

impl EmbeddingEngine {
    /// Load the model from the Hugging Face hub (downloads on first use).
    ///
    /// Blocking; call from `spawn_blocking` inside async code.
    pub fn new(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo.get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo.get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;
        let config: Config = serde_json::from_str(&config_contents)
            .context("Failed to parse model config")?;
        let dimension = serde_json::from_str::<serde_json::Value>(&config_contents)
            .ok()
            .and_then(|v| v.get("hidden_size").and_then(|h| h.as_u64()))
            .context("Model config has no hidden_size")? as usize;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        // SAFETY: the weights file is owned by the hub cache and not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load model weights")?
        };

        let model = BertModel::load(vb, &config)
            .context("Failed to create BERT model")?;

        tracing::info!(model_id, dimension, "embedding model loaded");

        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
            dimension,
            model_id: model_id.to_string(),
        })
    }

    /// Generate normalized embeddings for a batch of texts
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self.tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = encodings.len();

        // Right-pad ids and mask to the longest sequence
        let mut flat_ids = vec![0u32; batch_size * max_len];
        let mut flat_mask = vec![0u32; batch_size * max_len];
        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let row = i * max_len;
            flat_ids[row..row + ids.len()].copy_from_slice(ids);
            flat_mask[row..row + mask.len()].copy_from_slice(mask);
        }

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self.model.forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = Self::mean_pool(&hidden, &attention_mask)?;
        let normalized = Self::l2_normalize(&pooled)?;

        Ok(normalized.to_vec2::<f32>()?)
    }

    /// Mean pooling with attention mask
    fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask = attention_mask
            .to_dtype(hidden.dtype())?
            .unsqueeze(2)?
            .broadcast_as(hidden.shape())?;

        let summed = (hidden * &mask)?.sum(1)?;
        // An all-padding row pools to zeros instead of NaN
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
        Ok((summed / counts)?)
    }

    /// Unit-length rows so cosine distance stays within [0, 2]
    fn l2_normalize(embeddings: &Tensor) -> Result<Tensor> {
        let norms = embeddings.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
        Ok(embeddings.broadcast_div(&norms)?)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl Embedder for EmbeddingEngine {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let engine = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || engine.embed_batch(&texts))
            .await
            .context("Embedding task panicked")?
    }
}
