use std::sync::Arc;
use std::time::Instant;

use ragline_core::traits::{Embedder, VectorIndex};
use ragline_core::types::SearchResult;
use ragline_core::{Error, Result};
use tracing::{debug, error, info, warn};

/// Semantic search over one collection.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    collection: String,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, collection: impl Into<String>) -> Self {
        Self { embedder, index, collection: collection.into() }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Up to `limit` results scoring at least `score_threshold`, best first.
    ///
    /// Never fails: a missing or empty collection, or any backend error, is
    /// logged and yields no evidence.
    pub async fn retrieve(&self, query: &str, limit: usize, score_threshold: f32) -> Vec<SearchResult> {
        match self.try_retrieve(query, limit, score_threshold).await {
            Ok(results) => results,
            Err(e) => {
                error!(
                    error = %e,
                    collection = self.collection.as_str(),
                    "retrieval failed; continuing without evidence"
                );
                Vec::new()
            }
        }
    }

    /// Like [`Retriever::retrieve`] but surfaces backend errors.
    pub async fn try_retrieve(&self, query: &str, limit: usize, score_threshold: f32) -> Result<Vec<SearchResult>> {
        let started = Instant::now();
        if !self.index.collection_exists(&self.collection).await? {
            warn!(collection = self.collection.as_str(), "collection does not exist; build the index first");
            return Ok(Vec::new());
        }
        if self.index.count(&self.collection).await? == 0 {
            warn!(collection = self.collection.as_str(), "collection is empty");
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed_batch(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("embedder returned no vector for the query".into()))?;

        let mut results = self.index.search(&self.collection, &query_vector, limit, score_threshold).await?;
        results.retain(|r| r.score >= score_threshold);
        results.truncate(limit);

        info!(hits = results.len(), ms = started.elapsed().as_millis() as u64, "semantic search completed");
        for (rank, r) in results.iter().enumerate() {
            debug!(rank = rank + 1, file = r.file_name.as_str(), score = r.score, "hit");
        }
        Ok(results)
    }
}
