//! Vector index implementations: LanceDB on disk and an exact in-memory index.

use std::sync::Arc;

use ragline_core::config::{Settings, VectorBackend};
use ragline_core::traits::VectorIndex;
use ragline_core::Result;

pub mod lance;
pub mod memory;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use lance::LanceVectorIndex;
pub use memory::InMemoryVectorIndex;

/// Open the backend selected by `[vector]`.
pub async fn vector_index_from_settings(settings: &Settings) -> Result<Arc<dyn VectorIndex>> {
    match settings.vector.backend {
        VectorBackend::Lancedb => Ok(Arc::new(LanceVectorIndex::open(&settings.data.lancedb_dir()).await?)),
        VectorBackend::Memory => Ok(Arc::new(InMemoryVectorIndex::new())),
    }
}
