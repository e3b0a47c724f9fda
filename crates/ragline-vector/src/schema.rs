use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

/// Arrow schema of a chunk collection whose vectors have `dimension` floats.
pub fn build_chunk_schema(dimension: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("file_name", DataType::Utf8, false),
        Field::new("document_title", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("chunk_index", DataType::Int64, false),
        Field::new("content_length", DataType::Int64, false),
        Field::new("indexed_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension),
            true,
        ),
    ]))
}

/// Width of the `vector` column, if the schema has one.
pub fn vector_dimension(schema: &Schema) -> Option<usize> {
    match schema.field_with_name("vector").ok()?.data_type() {
        DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
        _ => None,
    }
}
