//! Embedding gateways: local BGE-M3 on candle and a deterministic hashing
//! embedder for tests and development.

use std::path::PathBuf;
use std::sync::Arc;

use ragline_core::config::{EmbeddingConfig, EmbeddingProvider};
use ragline_core::traits::Embedder;
use ragline_core::Result;
use tracing::info;

pub mod bge;
pub mod device;
pub mod hashed;
pub mod pool;
pub mod tokenize;

pub use bge::{resolve_model_dir, BgeM3Embedder, BGE_M3_DIM};
pub use hashed::HashedEmbedder;
pub use pool::masked_mean_l2;

/// Build the embedder selected by the `[embedding]` section.
pub fn embedder_from_settings(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbeddingProvider::Hashed => {
            info!(dim = config.dimension, "using hashed embedder");
            Ok(Arc::new(HashedEmbedder::new(config.dimension)?))
        }
        EmbeddingProvider::BgeM3 => {
            let configured = config.model_dir.as_deref().map(ragline_core::config::expand_path);
            let dir: PathBuf = resolve_model_dir(configured.as_deref())?;
            Ok(Arc::new(BgeM3Embedder::load(&dir, config.max_len)?))
        }
    }
}
