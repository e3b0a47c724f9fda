use chrono::Utc;
use ragline_core::traits::{Embedder, VectorIndex};
use ragline_core::types::{ChunkPayload, DocumentChunk, IndexedPoint};
use ragline_embed::HashedEmbedder;
use ragline_vector::LanceVectorIndex;
use tempfile::TempDir;
use uuid::Uuid;

const COLLECTION: &str = "documents_test_tmp";

fn chunks() -> Vec<DocumentChunk> {
    [
        ("battery.pdf", "The phone battery lasts twelve hours and charges in forty minutes."),
        ("battery.pdf", "Battery replacement is covered for two years."),
        ("shipping.docx", "Orders ship within three business days to Europe and Asia."),
        ("returns.txt", "Returns are accepted within thirty days with a receipt."),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (file, content))| DocumentChunk {
        file_name: file.to_string(),
        document_title: format!("Guide {i}"),
        content: content.to_string(),
        chunk_index: i,
    })
    .collect()
}

async fn indexed(dir: &TempDir, embedder: &HashedEmbedder) -> LanceVectorIndex {
    let index = LanceVectorIndex::open(&dir.path().join("lancedb")).await.expect("open");
    index.ensure_collection(COLLECTION, embedder.dim()).await.expect("ensure");

    let chunks = chunks();
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let vectors = embedder.embed_batch(&texts).await.expect("embed");
    let now = Utc::now();
    let points = chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| IndexedPoint {
            id: Uuid::new_v4(),
            vector,
            payload: ChunkPayload::from_chunk(chunk, now),
        })
        .collect();
    index.upsert(COLLECTION, points).await.expect("upsert");
    index
}

#[tokio::test]
async fn lancedb_full_flow() {
    let tmp = TempDir::new().expect("tmp");
    let embedder = HashedEmbedder::new(128).expect("embedder");
    let index = indexed(&tmp, &embedder).await;

    assert!(index.collection_exists(COLLECTION).await.expect("exists"));
    assert_eq!(index.count(COLLECTION).await.expect("count"), 4);

    let query = embedder.embed_text("how long does the phone battery last");
    let results = index.search(COLLECTION, &query, 3, 0.0).await.expect("search");
    assert!(!results.is_empty());
    assert!(results.len() <= 3);
    assert_eq!(results[0].file_name, "battery.pdf");
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score), "sorted by descending score");
    assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
    assert_eq!(results[0].content_length, results[0].content.chars().count());

    let strict = index.search(COLLECTION, &query, 3, 0.99).await.expect("search");
    assert!(strict.iter().all(|r| r.score >= 0.99));
}

#[tokio::test]
async fn drop_and_dimension_mismatch() {
    let tmp = TempDir::new().expect("tmp");
    let embedder = HashedEmbedder::new(64).expect("embedder");
    let index = indexed(&tmp, &embedder).await;

    assert!(index.ensure_collection(COLLECTION, 32).await.is_err(), "dimension is fixed once created");

    index.drop_collection(COLLECTION).await.expect("drop");
    assert!(!index.collection_exists(COLLECTION).await.expect("exists"));
    assert_eq!(index.count(COLLECTION).await.expect("count"), 0);
    assert!(index.search(COLLECTION, &[0.0; 64], 3, 0.0).await.expect("search").is_empty());

    index.ensure_collection(COLLECTION, 32).await.expect("recreate with new dimension");
    assert_eq!(index.count(COLLECTION).await.expect("count"), 0);
}
