use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use ragline_core::traits::Embedder;
use ragline_core::{Error, Result};
use twox_hash::XxHash64;

/// Deterministic bag-of-words embedder: each lower-cased token is hashed into
/// a bucket and the vector is L2-normalised. Texts sharing words score high
/// under cosine similarity, which is enough for tests and offline development.
pub struct HashedEmbedder {
    dim: usize,
    id: String,
}

impl HashedEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("hashed embedder dimension must be at least 1".into()));
        }
        Ok(Self { dim, id: format!("hashed:d{dim}") })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        for (i, token) in tokens.enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += 1.0 + val + (i % 3) as f32 * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashedEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
