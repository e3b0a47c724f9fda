//! Wiring shared by the command-line binaries.

use std::sync::Arc;

use anyhow::Context;
use ragline_core::config::{Config, Settings};
use ragline_core::logging;
use ragline_core::traits::{Embedder, VectorIndex};
use ragline_core::types::SearchResult;
use ragline_embed::embedder_from_settings;
use ragline_vector::vector_index_from_settings;

/// Load configuration for `RUST_ENV` and install logging.
pub fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().context("loading configuration")?;
    let settings = config.settings()?;
    logging::init_with_config(&settings.logging);
    Ok(settings)
}

/// Embedder and vector index selected by the configuration.
pub async fn open_store(settings: &Settings) -> anyhow::Result<(Arc<dyn Embedder>, Arc<dyn VectorIndex>)> {
    let embedder = embedder_from_settings(&settings.embedding).context("loading embedder")?;
    let index = vector_index_from_settings(settings).await.context("opening vector index")?;
    Ok((embedder, index))
}

pub fn print_results(results: &[SearchResult]) {
    for (i, r) in results.iter().enumerate() {
        println!("\n  {}. score={:.4}  file={}  chunk={}", i + 1, r.score, r.file_name, r.chunk_index);
        println!("     📄 {}", r.document_title);
        println!("     📝 {}", preview(&r.content, 200));
    }
}

fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}...")
}
