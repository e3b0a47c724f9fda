use std::collections::HashMap;

use async_trait::async_trait;
use ragline_core::traits::VectorIndex;
use ragline_core::types::{IndexedPoint, SearchResult};
use ragline_core::{Error, Result};
use tokio::sync::RwLock;

struct Collection {
    dimension: usize,
    points: Vec<IndexedPoint>,
}

/// Exact cosine search over points held in memory. Nothing is persisted.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn missing(collection: &str) -> Error {
    Error::NotFound(format!("collection '{collection}'"))
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(collection))
    }

    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        match collections.get(collection) {
            Some(existing) if existing.dimension != dimension => Err(Error::VectorStore(format!(
                "collection '{collection}' stores {}-dimensional vectors, got {dimension}",
                existing.dimension
            ))),
            Some(_) => Ok(()),
            None => {
                collections.insert(collection.to_string(), Collection { dimension, points: Vec::new() });
                Ok(())
            }
        }
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.collections.write().await.remove(collection);
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let target = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != target.dimension) {
            return Err(Error::VectorStore(format!(
                "point {} has {} dimensions, collection expects {}",
                bad.id,
                bad.vector.len(),
                target.dimension
            )));
        }
        for point in points {
            match target.points.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => *existing = point,
                None => target.points.push(point),
            }
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.collections.read().await.get(collection).map_or(0, |c| c.points.len()))
    }

    async fn search(&self, collection: &str, query: &[f32], limit: usize, min_score: f32) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let Some(target) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut scored: Vec<(f32, &IndexedPoint)> = target
            .points
            .iter()
            .map(|p| (cosine_similarity(query, &p.vector).clamp(0.0, 1.0), p))
            .filter(|(score, _)| *score >= min_score)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, p)| SearchResult::from_payload(score, p.payload.clone()))
            .collect())
    }
}
