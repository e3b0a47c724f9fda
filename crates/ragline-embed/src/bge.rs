use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use ragline_core::traits::Embedder;
use ragline_core::{Error, Result};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

pub const BGE_M3_DIM: usize = 1024;

struct BgeModel {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
}

impl BgeModel {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids =
            Tensor::zeros((texts.len(), self.max_len), DType::I64, &self.device).map_err(Error::embedding)?;
        let hidden = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)
            .map_err(Error::embedding)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask).map_err(Error::embedding)?;
        let vectors: Vec<Vec<f32>> = pooled
            .to_device(&Device::Cpu)
            .and_then(|t| t.to_vec2())
            .map_err(Error::embedding)?;
        if let Some(v) = vectors.first() {
            if v.len() != BGE_M3_DIM {
                return Err(Error::Embedding(format!("expected {BGE_M3_DIM} dimensions, model produced {}", v.len())));
            }
        }
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 * texts.len() as u128 {
            warn!(batch = texts.len(), ms = elapsed.as_millis() as u64, "slow embedding batch");
        } else {
            debug!(batch = texts.len(), ms = elapsed.as_millis() as u64, "embedded batch");
        }
        Ok(vectors)
    }
}

/// BGE-M3 (XLM-RoBERTa) running locally on candle.
pub struct BgeM3Embedder {
    inner: Arc<BgeModel>,
    id: String,
}

impl BgeM3Embedder {
    /// Load tokenizer, config and weights from a BGE-M3 model directory.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading BGE-M3 model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::InvalidConfig(format!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))
        })?;

        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| Error::InvalidConfig(format!("bad model config {}: {e}", config_path.display())))?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights: HashMap<String, Tensor> = candle_core::pickle::read_all(&weights_path)
            .map_err(Error::embedding)?
            .into_iter()
            .collect();
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb).map_err(Error::embedding)?;
        info!("BGE-M3 model loaded");

        Ok(Self {
            inner: Arc::new(BgeModel { model, tokenizer, device, max_len }),
            id: format!("bge-m3:d{BGE_M3_DIM}"),
        })
    }

    pub fn dim(&self) -> usize {
        BGE_M3_DIM
    }
}

#[async_trait]
impl Embedder for BgeM3Embedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let inner = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || inner.embed(&texts))
            .await
            .map_err(Error::embedding)?
    }
}

/// Locate the model directory: the configured path if given, otherwise the
/// conventional `models/bge-m3` next to or above the working directory.
pub fn resolve_model_dir(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        if dir.exists() {
            return Ok(dir.to_path_buf());
        }
        return Err(Error::NotFound(format!("BGE-M3 model directory {}", dir.display())));
    }
    for candidate in ["models/bge-m3", "../models/bge-m3"] {
        let p = Path::new(candidate);
        if p.exists() {
            debug!(dir = %p.display(), "using model dir");
            return Ok(p.to_path_buf());
        }
    }
    Err(Error::NotFound("BGE-M3 model directory (set embedding.model_dir)".into()))
}
