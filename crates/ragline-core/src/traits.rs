//! Capability contracts for the external collaborators the pipeline drives.
//!
//! Implementations are constructed explicitly and handed to the indexer,
//! retriever and orchestrator as `Arc<dyn ...>`; nothing here is global.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ConversationTurn, IndexedPoint, SearchResult};

/// Text to fixed-length vector. All vectors from one embedder share a dimension.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model, e.g. `bge-m3:d1024`.
    fn embedder_id(&self) -> &str;

    /// Embed a batch of texts, one vector per input in the same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Nearest-neighbour storage for [`IndexedPoint`]s, grouped into named collections.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn collection_exists(&self, collection: &str) -> Result<bool>;

    /// Create the collection with the given vector dimension if it is missing.
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()>;

    async fn drop_collection(&self, collection: &str) -> Result<()>;

    async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> Result<()>;

    async fn count(&self, collection: &str) -> Result<usize>;

    /// Up to `limit` matches with cosine score `>= min_score`, best first.
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;
}

/// Inputs of a single language model call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub system_instruction: &'a str,
    pub history: &'a [ConversationTurn],
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Result of a language model call.
///
/// `Failed` means the gateway itself could not produce an answer (safety block,
/// transport error, empty candidate); it carries user-presentable fallback text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Completed(String),
    Failed(String),
}

impl Generation {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Completed(text) | Self::Failed(text) => text,
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Never errors: failures are reported as [`Generation::Failed`].
    async fn generate(&self, request: GenerationRequest<'_>) -> Generation;
}
