use std::path::Path;

use async_trait::async_trait;
use lancedb::{Connection, Table};
use ragline_core::traits::VectorIndex;
use ragline_core::types::{IndexedPoint, SearchResult};
use ragline_core::{Error, Result};
use tracing::{debug, info};

use crate::schema::{build_chunk_schema, vector_dimension};
use crate::search::vector_search;
use crate::table::{drop_table, ensure_table, open_db, table_exists};
use crate::writer::append_points;

/// Persistent vector index: one LanceDB table per collection.
pub struct LanceVectorIndex {
    db: Connection,
}

impl LanceVectorIndex {
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let db = open_db(path.to_string_lossy().as_ref()).await?;
        info!(path = %path.display(), "opened LanceDB");
        Ok(Self { db })
    }

    async fn table(&self, collection: &str) -> Result<Table> {
        self.db.open_table(collection).execute().await.map_err(Error::vector_store)
    }

    async fn dimension_of(&self, table: &Table) -> Result<usize> {
        let schema = table.schema().await.map_err(Error::vector_store)?;
        vector_dimension(&schema)
            .ok_or_else(|| Error::VectorStore(format!("table '{}' has no vector column", table.name())))
    }
}

#[async_trait]
impl VectorIndex for LanceVectorIndex {
    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        table_exists(&self.db, collection).await
    }

    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        if table_exists(&self.db, collection).await? {
            let existing = self.dimension_of(&self.table(collection).await?).await?;
            if existing != dimension {
                return Err(Error::VectorStore(format!(
                    "collection '{collection}' stores {existing}-dimensional vectors, \
                     embedder produces {dimension}; rebuild with overwrite"
                )));
            }
            return Ok(());
        }
        let width = i32::try_from(dimension).map_err(Error::vector_store)?;
        ensure_table(&self.db, collection, build_chunk_schema(width)).await?;
        debug!(collection, dimension, "created collection");
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        drop_table(&self.db, collection).await?;
        debug!(collection, "dropped collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> Result<()> {
        let table = self.table(collection).await?;
        let dimension = self.dimension_of(&table).await?;
        append_points(&table, &points, dimension).await
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        if !table_exists(&self.db, collection).await? {
            return Ok(0);
        }
        self.table(collection).await?.count_rows(None).await.map_err(Error::vector_store)
    }

    async fn search(&self, collection: &str, query: &[f32], limit: usize, min_score: f32) -> Result<Vec<SearchResult>> {
        if limit == 0 || !table_exists(&self.db, collection).await? {
            return Ok(Vec::new());
        }
        let table = self.table(collection).await?;
        if table.count_rows(None).await.map_err(Error::vector_store)? == 0 {
            return Ok(Vec::new());
        }
        vector_search(&table, query, limit, min_score).await
    }
}
