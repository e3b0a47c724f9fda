use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use ragline_core::chunker::DocumentProcessor;
use ragline_core::traits::{Embedder, VectorIndex};
use ragline_core::types::{ChunkPayload, DocumentChunk, IndexedPoint};
use ragline_core::{Error, Result};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::IndexError;

/// Embedded once to learn the embedder's output dimension.
const DIMENSION_PROBE: &str = "sample text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Success,
    NoDocuments,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexBuildReport {
    pub status: IndexStatus,
    pub total_chunks: usize,
    pub processing_time_seconds: f64,
    pub error: Option<String>,
    pub documents_folder: String,
    pub points_in_collection: usize,
}

/// Builds the searchable corpus of one collection from a documents folder.
///
/// Builds are serialised: concurrent calls on the same `Indexer` run one
/// after another.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    batch_size: usize,
    show_progress: bool,
    processor: DocumentProcessor,
    build_lock: Mutex<()>,
}

impl Indexer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            collection: collection.into(),
            batch_size: batch_size.max(1),
            show_progress: false,
            processor: DocumentProcessor::new(),
            build_lock: Mutex::new(()),
        }
    }

    /// Draw a progress bar on stderr while embedding.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Index every supported document in `folder`.
    ///
    /// With `overwrite == false` an existing collection is left as is and the
    /// call reports success with zero chunks. With `overwrite == true` the
    /// collection is dropped and rebuilt. Only a missing folder is an `Err`;
    /// embedding and storage failures come back as [`IndexStatus::Failed`].
    pub async fn build_index(
        &self,
        folder: &Path,
        overwrite: bool,
    ) -> std::result::Result<IndexBuildReport, IndexError> {
        let _guard = self.build_lock.lock().await;
        let started = Instant::now();
        if !folder.is_dir() {
            error!(folder = %folder.display(), "documents folder not found");
            return Err(IndexError::MissingFolder(folder.to_path_buf()));
        }
        info!(folder = %folder.display(), collection = self.collection.as_str(), overwrite, "index build started");

        let outcome = self.run_build(folder, overwrite).await;
        let elapsed = started.elapsed().as_secs_f64();
        let report = match outcome {
            Ok((status, total_chunks, points_in_collection)) => IndexBuildReport {
                status,
                total_chunks,
                processing_time_seconds: elapsed,
                error: None,
                documents_folder: folder.display().to_string(),
                points_in_collection,
            },
            Err(Error::NotFound(_)) if !folder.is_dir() => return Err(IndexError::MissingFolder(folder.to_path_buf())),
            Err(e) => {
                error!(error = %e, "index build failed");
                IndexBuildReport {
                    status: IndexStatus::Failed,
                    total_chunks: 0,
                    processing_time_seconds: elapsed,
                    error: Some(e.to_string()),
                    documents_folder: folder.display().to_string(),
                    points_in_collection: self.index.count(&self.collection).await.unwrap_or(0),
                }
            }
        };
        info!(
            status = ?report.status,
            chunks = report.total_chunks,
            points = report.points_in_collection,
            secs = report.processing_time_seconds,
            "index build finished"
        );
        Ok(report)
    }

    async fn run_build(&self, folder: &Path, overwrite: bool) -> Result<(IndexStatus, usize, usize)> {
        if !overwrite && self.index.collection_exists(&self.collection).await? {
            info!(collection = self.collection.as_str(), "collection already built; pass overwrite to rebuild");
            let points = self.index.count(&self.collection).await?;
            return Ok((IndexStatus::Success, 0, points));
        }

        let chunks = self.scan(folder.to_path_buf()).await?;
        if chunks.is_empty() {
            warn!(folder = %folder.display(), "no chunks produced; index left untouched");
            return Ok((IndexStatus::NoDocuments, 0, self.index.count(&self.collection).await?));
        }

        let dimension = self.probe_dimension().await?;
        if overwrite {
            self.index.drop_collection(&self.collection).await?;
        }
        self.index.ensure_collection(&self.collection, dimension).await?;

        let total = chunks.len();
        self.embed_and_upsert(chunks).await?;

        let points = self.index.count(&self.collection).await?;
        if points < total {
            warn!(expected = total, found = points, "collection holds fewer points than chunks indexed");
        }
        Ok((IndexStatus::Success, total, points))
    }

    async fn scan(&self, folder: PathBuf) -> Result<Vec<DocumentChunk>> {
        let processor = self.processor;
        let scan = tokio::task::spawn_blocking(move || processor.process_folder(&folder))
            .await
            .map_err(|e| Error::Operation(format!("document scan task failed: {e}")))??;
        Ok(scan.chunks)
    }

    async fn probe_dimension(&self) -> Result<usize> {
        let probe = self.embedder.embed_batch(&[DIMENSION_PROBE.to_string()]).await?;
        match probe.first().map(Vec::len) {
            Some(dim) if dim > 0 => Ok(dim),
            _ => Err(Error::Embedding("embedder returned no vector for the dimension probe".into())),
        }
    }

    async fn embed_and_upsert(&self, chunks: Vec<DocumentChunk>) -> Result<()> {
        let progress = self.progress_bar(chunks.len() as u64);
        let indexed_at = Utc::now();
        let mut remaining = chunks.into_iter().peekable();

        while remaining.peek().is_some() {
            let batch: Vec<DocumentChunk> = remaining.by_ref().take(self.batch_size).collect();
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            let points: Vec<IndexedPoint> = batch
                .into_iter()
                .zip(vectors)
                .map(|(chunk, vector)| IndexedPoint {
                    id: Uuid::new_v4(),
                    vector,
                    payload: ChunkPayload::from_chunk(chunk, indexed_at),
                })
                .collect();
            let n = points.len() as u64;
            self.index.upsert(&self.collection, points).await?;
            progress.inc(n);
        }
        progress.finish_with_message("indexed");
        Ok(())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
