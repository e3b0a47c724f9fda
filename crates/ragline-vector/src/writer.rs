use arrow_array::types::Float32Type;
use arrow_array::{
    FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray,
};
use lancedb::Table;
use ragline_core::types::IndexedPoint;
use ragline_core::{Error, Result};
use std::sync::Arc;

use crate::schema::build_chunk_schema;

/// Columnar form of `points`. Every vector must have exactly `dimension` floats.
pub fn points_to_record_batch(points: &[IndexedPoint], dimension: usize) -> Result<RecordBatch> {
    if let Some(bad) = points.iter().find(|p| p.vector.len() != dimension) {
        return Err(Error::VectorStore(format!(
            "point {} has {} dimensions, collection expects {dimension}",
            bad.id,
            bad.vector.len()
        )));
    }
    let width = i32::try_from(dimension).map_err(Error::vector_store)?;

    let mut ids = Vec::with_capacity(points.len());
    let mut file_names = Vec::with_capacity(points.len());
    let mut titles = Vec::with_capacity(points.len());
    let mut contents = Vec::with_capacity(points.len());
    let mut chunk_indices = Vec::with_capacity(points.len());
    let mut lengths = Vec::with_capacity(points.len());
    let mut indexed_at = Vec::with_capacity(points.len());
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(points.len());
    for p in points {
        ids.push(p.id.to_string());
        file_names.push(p.payload.file_name.clone());
        titles.push(p.payload.document_title.clone());
        contents.push(p.payload.content.clone());
        chunk_indices.push(p.payload.chunk_index as i64);
        lengths.push(p.payload.content_length as i64);
        indexed_at.push(p.payload.indexed_at.timestamp_millis());
        vectors.push(Some(p.vector.iter().map(|&x| Some(x)).collect()));
    }

    RecordBatch::try_new(
        build_chunk_schema(width),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(file_names)),
            Arc::new(StringArray::from(titles)),
            Arc::new(StringArray::from(contents)),
            Arc::new(Int64Array::from(chunk_indices)),
            Arc::new(Int64Array::from(lengths)),
            Arc::new(TimestampMillisecondArray::from(indexed_at)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, width)),
        ],
    )
    .map_err(Error::vector_store)
}

pub async fn append_points(table: &Table, points: &[IndexedPoint], dimension: usize) -> Result<()> {
    if points.is_empty() {
        return Ok(());
    }
    let batch = points_to_record_batch(points, dimension)?;
    let schema = batch.schema();
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
    table.add(reader).execute().await.map_err(Error::vector_store)?;
    Ok(())
}
