use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ragline_core::config::Settings;
use ragline_core::traits::{Embedder, Generation, GenerationRequest, LanguageModel, VectorIndex};
use ragline_core::types::{ConversationTurn, OutcomeKind};
use ragline_core::CHUNK_BOUNDARY;
use ragline_embed::HashedEmbedder;
use ragline_pipeline::orchestrator::{EMPTY_ANSWER_MESSAGE, INTERNAL_FAULT_MESSAGE, REJECTION_MESSAGE};
use ragline_pipeline::{FastResponses, IndexError, IndexStatus, Indexer, Orchestrator, Retriever, NO_EVIDENCE};
use ragline_vector::InMemoryVectorIndex;
use tempfile::TempDir;

const COLLECTION: &str = "documents";

#[derive(Debug, Clone)]
struct RecordedCall {
    prompt: String,
    system_instruction: String,
    history: Vec<ConversationTurn>,
    max_tokens: u32,
}

/// Replays scripted generations and records every request.
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<Generation>>,
    calls: Mutex<Vec<RecordedCall>>,
    panic_on_call: bool,
}

impl ScriptedModel {
    fn replying(replies: Vec<Generation>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into()), ..Self::default() })
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Generation {
        if self.panic_on_call {
            panic!("model exploded");
        }
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: request.prompt.to_string(),
            system_instruction: request.system_instruction.to_string(),
            history: request.history.to_vec(),
            max_tokens: request.max_tokens,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Generation::Completed("ok".into()))
    }
}

/// Hashed embedder that counts how many batches it was asked for.
struct CountingEmbedder {
    inner: HashedEmbedder,
    batches: AtomicUsize,
}

impl CountingEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self { inner: HashedEmbedder::new(256).unwrap(), batches: AtomicUsize::new(0) })
    }

    fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn embedder_id(&self) -> &str {
        self.inner.embedder_id()
    }

    async fn embed_batch(&self, texts: &[String]) -> ragline_core::Result<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }
}

struct Harness {
    embedder: Arc<CountingEmbedder>,
    index: Arc<InMemoryVectorIndex>,
    settings: Settings,
}

impl Harness {
    fn new() -> Self {
        Self {
            embedder: CountingEmbedder::new(),
            index: Arc::new(InMemoryVectorIndex::new()),
            settings: Settings::default(),
        }
    }

    fn indexer(&self) -> Indexer {
        Indexer::new(self.embedder.clone(), self.index.clone(), COLLECTION, 2)
    }

    fn retriever(&self) -> Retriever {
        Retriever::new(self.embedder.clone(), self.index.clone(), COLLECTION)
    }

    fn orchestrator(&self, model: Arc<ScriptedModel>) -> Orchestrator {
        let fast = Arc::new(FastResponses::new(&self.settings.fast_responses));
        Orchestrator::new(model, self.retriever(), fast, &self.settings)
    }
}

fn write_corpus(dir: &Path) {
    fs::write(
        dir.join("battery.txt"),
        format!(
            "Battery Guide\nBattery replacement is covered by a two year warranty.\n{CHUNK_BOUNDARY}\nCharge the battery overnight before first use."
        ),
    )
    .unwrap();
    fs::write(dir.join("shipping.txt"), "Shipping Policy\nOrders ship within three business days.").unwrap();
    fs::write(dir.join("logo.png"), b"\x89PNG").unwrap();
}

#[tokio::test]
async fn greeting_takes_the_fast_path() {
    let harness = Harness::new();
    let model = ScriptedModel::replying(vec![]);
    let outcome = harness.orchestrator(model.clone()).run_pipeline("  Hi  ", &[]).await;

    assert_eq!(outcome.kind, OutcomeKind::FastPath);
    assert_eq!(outcome.response_text, "Hello! What can I do for you?");
    assert!(outcome.sources.is_empty());
    assert!(model.calls().is_empty());
    assert_eq!(harness.embedder.batches(), 0);
}

#[tokio::test]
async fn too_short_questions_are_rejected_without_model_calls() {
    let harness = Harness::new();
    let model = ScriptedModel::replying(vec![]);
    let orchestrator = harness.orchestrator(model.clone());

    for question in ["", "   ", "a", "\u{1F600}\u{1F600}"] {
        let outcome = orchestrator.run_pipeline(question, &[]).await;
        assert_eq!(outcome.kind, OutcomeKind::Rejected, "question {question:?}");
        assert_eq!(outcome.response_text, REJECTION_MESSAGE);
    }
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn invalid_extraction_still_answers_without_evidence() {
    let harness = Harness::new();
    let model = ScriptedModel::replying(vec![
        Generation::Completed("INVALID".into()),
        Generation::Completed("I can only help with our products.".into()),
    ]);
    let outcome = harness.orchestrator(model.clone()).run_pipeline("what is the weather in Paris?", &[]).await;

    assert_eq!(outcome.kind, OutcomeKind::Answered);
    assert_eq!(outcome.response_text, "I can only help with our products.");
    assert!(outcome.sources.is_empty());
    assert_eq!(harness.embedder.batches(), 0);

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].max_tokens, 500);
    assert_eq!(calls[1].max_tokens, 3000);
    assert!(calls[1].system_instruction.ends_with(&format!("\nRAG Context: {NO_EVIDENCE}")));
}

#[tokio::test]
async fn extraction_gateway_failure_stops_the_run() {
    let harness = Harness::new();
    let fallback = "The AI service is temporarily unavailable. Please try again later.";
    let model = ScriptedModel::replying(vec![Generation::Failed(fallback.into())]);
    let outcome = harness.orchestrator(model.clone()).run_pipeline("how long does shipping take?", &[]).await;

    assert_eq!(outcome.kind, OutcomeKind::GatewayFailure);
    assert_eq!(outcome.response_text, fallback);
    assert!(outcome.sources.is_empty());
    assert_eq!(model.calls().len(), 1);
    assert_eq!(harness.embedder.batches(), 0);
}

#[tokio::test]
async fn answer_gateway_failure_keeps_the_sources_sent_to_the_model() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let harness = Harness::new();
    harness.indexer().build_index(tmp.path(), true).await.unwrap();

    let model = ScriptedModel::replying(vec![
        Generation::Completed("QUERY: battery replacement warranty".into()),
        Generation::Failed("blocked".into()),
    ]);
    let outcome = harness.orchestrator(model.clone()).run_pipeline("is battery replacement under warranty?", &[]).await;

    assert_eq!(outcome.kind, OutcomeKind::GatewayFailure);
    assert_eq!(outcome.response_text, "blocked");
    assert!(!outcome.sources.is_empty());
    assert_eq!(outcome.sources[0].file_name, "battery.txt");

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    for source in &outcome.sources {
        assert!(calls[1].system_instruction.contains(&format!("File: {}", source.file_name)));
    }
}

#[tokio::test]
async fn indexed_corpus_grounds_the_answer() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let harness = Harness::new();

    let report = harness.indexer().build_index(tmp.path(), true).await.unwrap();
    assert_eq!(report.status, IndexStatus::Success);
    assert_eq!(report.total_chunks, 3);
    assert_eq!(report.points_in_collection, 3);
    assert!(report.error.is_none());

    let model = ScriptedModel::replying(vec![
        Generation::Completed("QUERY: battery replacement warranty".into()),
        Generation::Completed("Battery replacement is covered for two years.".into()),
    ]);
    let outcome =
        harness.orchestrator(model.clone()).run_pipeline("Is my battery replacement under warranty??", &[]).await;

    assert_eq!(outcome.kind, OutcomeKind::Answered);
    assert_eq!(outcome.response_text, "Battery replacement is covered for two years.");
    assert!(!outcome.sources.is_empty());
    assert_eq!(outcome.sources[0].file_name, "battery.txt");
    assert!(outcome.sources.iter().all(|s| s.score >= harness.settings.retrieval.score_threshold));

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].prompt, "Is my battery replacement under warranty??");
    assert!(calls[1].system_instruction.contains("--- Document Source 1 ---\nFile: battery.txt\nTitle: Battery Guide"));
}

#[tokio::test]
async fn rebuild_without_overwrite_does_no_work() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let harness = Harness::new();
    harness.indexer().build_index(tmp.path(), true).await.unwrap();
    let embeds_after_first_build = harness.embedder.batches();

    let report = harness.indexer().build_index(tmp.path(), false).await.unwrap();
    assert_eq!(report.status, IndexStatus::Success);
    assert_eq!(report.total_chunks, 0);
    assert_eq!(report.points_in_collection, 3);
    assert_eq!(harness.embedder.batches(), embeds_after_first_build);
}

#[tokio::test]
async fn overwrite_replaces_the_collection() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let harness = Harness::new();
    harness.indexer().build_index(tmp.path(), true).await.unwrap();

    fs::remove_file(tmp.path().join("shipping.txt")).unwrap();
    let report = harness.indexer().build_index(tmp.path(), true).await.unwrap();
    assert_eq!(report.total_chunks, 2);
    assert_eq!(harness.index.count(COLLECTION).await.unwrap(), 2);
}

#[tokio::test]
async fn missing_folder_is_an_error() {
    let harness = Harness::new();
    let result = harness.indexer().build_index(Path::new("/definitely/not/here"), true).await;
    assert!(matches!(result, Err(IndexError::MissingFolder(_))));
    assert_eq!(harness.embedder.batches(), 0);
}

#[tokio::test]
async fn folder_without_documents_leaves_index_untouched() {
    let full = TempDir::new().unwrap();
    write_corpus(full.path());
    let empty = TempDir::new().unwrap();
    fs::write(empty.path().join("notes.csv"), "a,b").unwrap();

    let harness = Harness::new();
    harness.indexer().build_index(full.path(), true).await.unwrap();

    let report = harness.indexer().build_index(empty.path(), true).await.unwrap();
    assert_eq!(report.status, IndexStatus::NoDocuments);
    assert_eq!(report.total_chunks, 0);
    assert_eq!(harness.index.count(COLLECTION).await.unwrap(), 3);
}

#[tokio::test]
async fn retrieval_respects_threshold_limit_and_order() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let harness = Harness::new();
    harness.indexer().build_index(tmp.path(), true).await.unwrap();
    let retriever = harness.retriever();
    assert_eq!(retriever.collection(), COLLECTION);

    let all = retriever.retrieve("orders ship within three business days", 10, 0.0).await;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].file_name, "shipping.txt");
    assert!(all.windows(2).all(|w| w[0].score >= w[1].score));

    let limited = retriever.retrieve("battery", 1, 0.0).await;
    assert_eq!(limited.len(), 1);

    let strict = retriever.retrieve("orders ship within three business days", 10, 0.5).await;
    assert!(!strict.is_empty());
    assert!(strict.iter().all(|r| r.score >= 0.5));
}

#[tokio::test]
async fn retrieval_before_indexing_finds_nothing() {
    let harness = Harness::new();
    assert!(harness.retriever().retrieve("battery", 3, 0.0).await.is_empty());
}

#[tokio::test]
async fn history_is_windowed_to_recent_turns() {
    let harness = Harness::new();
    let history: Vec<ConversationTurn> =
        (0..8).map(|i| ConversationTurn::new(format!("question {i}"), format!("answer {i}"))).collect();
    let model = ScriptedModel::replying(vec![Generation::Completed("INVALID".into())]);
    harness.orchestrator(model.clone()).run_pipeline("and what about the charger?", &history).await;

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    for call in &calls {
        assert_eq!(call.history.len(), 5);
        assert_eq!(call.history[0].question, "question 3");
        assert_eq!(call.history[4].question, "question 7");
    }
}

#[tokio::test]
async fn blank_answer_becomes_an_apology() {
    let harness = Harness::new();
    let model =
        ScriptedModel::replying(vec![Generation::Completed("INVALID".into()), Generation::Completed("  ".into())]);
    let outcome = harness.orchestrator(model).run_pipeline("tell me about the laptop", &[]).await;

    assert_eq!(outcome.kind, OutcomeKind::Answered);
    assert_eq!(outcome.response_text, EMPTY_ANSWER_MESSAGE);
}

#[tokio::test]
async fn internal_fault_becomes_an_error_outcome() {
    let harness = Harness::new();
    let model = Arc::new(ScriptedModel { panic_on_call: true, ..ScriptedModel::default() });
    let outcome = harness.orchestrator(model).run_pipeline("what does the warranty cover?", &[]).await;

    assert_eq!(outcome.kind, OutcomeKind::Error);
    assert_eq!(outcome.response_text, INTERNAL_FAULT_MESSAGE);
    assert!(outcome.sources.is_empty());
}

#[tokio::test]
async fn concurrent_runs_share_one_orchestrator() {
    let harness = Harness::new();
    let orchestrator = Arc::new(harness.orchestrator(ScriptedModel::replying(vec![])));
    let handles: Vec<_> = ["hello", "thanks", "hi"]
        .into_iter()
        .map(|q| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.run_pipeline(q, &[]).await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().kind, OutcomeKind::FastPath);
    }
}
