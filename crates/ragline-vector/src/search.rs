use arrow_array::{Array, Float32Array, Int64Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use ragline_core::types::SearchResult;
use ragline_core::{Error, Result};

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::VectorStore(format!("column '{name}' missing or of unexpected type")))
}

/// Map one result batch of a cosine vector search into [`SearchResult`]s.
/// Cosine distance is `1 - similarity`, so the score is `1 - _distance`.
pub fn batch_to_results(batch: &RecordBatch) -> Result<Vec<SearchResult>> {
    let file_names = column::<StringArray>(batch, "file_name")?;
    let titles = column::<StringArray>(batch, "document_title")?;
    let contents = column::<StringArray>(batch, "content")?;
    let chunk_indices = column::<Int64Array>(batch, "chunk_index")?;
    let lengths = column::<Int64Array>(batch, "content_length")?;
    let distances = column::<Float32Array>(batch, "_distance")?;

    Ok((0..batch.num_rows())
        .map(|i| SearchResult {
            score: (1.0 - distances.value(i)).clamp(0.0, 1.0),
            file_name: file_names.value(i).to_string(),
            document_title: titles.value(i).to_string(),
            content: contents.value(i).to_string(),
            chunk_index: usize::try_from(chunk_indices.value(i)).unwrap_or_default(),
            content_length: usize::try_from(lengths.value(i)).unwrap_or_default(),
        })
        .collect())
}

/// Top `limit` chunks by cosine similarity, keeping those scoring at least
/// `min_score`, best first.
pub async fn vector_search(table: &Table, query: &[f32], limit: usize, min_score: f32) -> Result<Vec<SearchResult>> {
    let mut stream = table
        .vector_search(query.to_vec())
        .map_err(Error::vector_store)?
        .distance_type(DistanceType::Cosine)
        .limit(limit)
        .execute()
        .await
        .map_err(Error::vector_store)?;

    let mut results = Vec::new();
    while let Some(batch) = stream.try_next().await.map_err(Error::vector_store)? {
        results.extend(batch_to_results(&batch)?);
    }
    results.retain(|r| r.score >= min_score);
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);
    Ok(results)
}
