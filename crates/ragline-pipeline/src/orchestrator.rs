use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use ragline_core::config::{PipelineConfig, RetrievalConfig, Settings};
use ragline_core::traits::{Generation, GenerationRequest, LanguageModel};
use ragline_core::types::{ConversationTurn, OutcomeKind, PipelineOutcome, SearchResult};
use tracing::{debug, error, info, warn};

use crate::cleaning::{clean_question, is_valid_question};
use crate::context::build_context;
use crate::fast_path::FastResponses;
use crate::prompts::Prompts;
use crate::query::ExtractedQuery;
use crate::retriever::Retriever;

pub const REJECTION_MESSAGE: &str = "Sorry I cannot answer that question. Please try asking something else.";
pub const INTERNAL_FAULT_MESSAGE: &str = "I apologise, but I encountered an unexpected error. Please try again later.";
pub const EMPTY_ANSWER_MESSAGE: &str = "I apologise, but I couldn't generate a proper response. Please try again.";

/// Drives a question through cleaning, fast path, validation, query
/// extraction, retrieval, context assembly and answer generation.
///
/// Holds only shared, read-only collaborators, so one instance serves any
/// number of concurrent runs.
pub struct Orchestrator {
    model: Arc<dyn LanguageModel>,
    retriever: Retriever,
    fast_responses: Arc<FastResponses>,
    prompts: Prompts,
    pipeline: PipelineConfig,
    retrieval: RetrievalConfig,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        retriever: Retriever,
        fast_responses: Arc<FastResponses>,
        settings: &Settings,
    ) -> Self {
        Self {
            model,
            retriever,
            fast_responses,
            prompts: Prompts::new(&settings.assistant),
            pipeline: settings.pipeline.clone(),
            retrieval: settings.retrieval.clone(),
        }
    }

    /// Answer `question` given the earlier `history`. Always returns an
    /// outcome; internal faults become a fixed apology.
    pub async fn run_pipeline(&self, question: &str, history: &[ConversationTurn]) -> PipelineOutcome {
        let started = Instant::now();
        info!(chars = question.chars().count(), history = history.len(), "pipeline started");

        let outcome = match AssertUnwindSafe(self.run_steps(question, history)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                error!(detail = detail.as_str(), "pipeline fault");
                PipelineOutcome::without_sources(OutcomeKind::Error, INTERNAL_FAULT_MESSAGE)
            }
        };

        info!(
            kind = ?outcome.kind,
            sources = outcome.sources.len(),
            chars = outcome.response_text.chars().count(),
            ms = started.elapsed().as_millis() as u64,
            "pipeline finished"
        );
        outcome
    }

    async fn run_steps(&self, question: &str, history: &[ConversationTurn]) -> PipelineOutcome {
        let cleaned = clean_question(question, self.pipeline.max_question_chars);
        debug!(cleaned = cleaned.as_str(), "question cleaned");

        if let Some(reply) = self.fast_responses.lookup(&cleaned) {
            info!("fast response used");
            return PipelineOutcome::without_sources(OutcomeKind::FastPath, reply);
        }

        if !is_valid_question(&cleaned, self.pipeline.min_question_chars) {
            info!(chars = cleaned.chars().count(), "question rejected");
            return PipelineOutcome::without_sources(OutcomeKind::Rejected, REJECTION_MESSAGE);
        }

        let history = self.history_window(history);

        let sources = match self.extract_query(&cleaned, history).await {
            ExtractedQuery::GatewayFailure(fallback) => {
                warn!("query extraction gateway failed");
                return PipelineOutcome::without_sources(OutcomeKind::GatewayFailure, fallback);
            }
            ExtractedQuery::Invalid => {
                info!("query marked invalid; answering without evidence");
                Vec::new()
            }
            ExtractedQuery::Valid(query) => self.retrieve(&query).await,
        };

        let context = build_context(&sources);
        debug!(context_chars = context.chars().count(), "context built");

        match self.generate_answer(&cleaned, history, &context).await {
            Generation::Failed(fallback) => {
                warn!(sources = sources.len(), "answer gateway failed");
                PipelineOutcome { kind: OutcomeKind::GatewayFailure, response_text: clean_response(fallback), sources }
            }
            Generation::Completed(answer) => PipelineOutcome {
                kind: OutcomeKind::Answered,
                response_text: clean_response(answer),
                sources,
            },
        }
    }

    /// The most recent turns, oldest first.
    fn history_window<'h>(&self, history: &'h [ConversationTurn]) -> &'h [ConversationTurn] {
        let keep = self.pipeline.history_turns.min(history.len());
        &history[history.len() - keep..]
    }

    async fn extract_query(&self, cleaned: &str, history: &[ConversationTurn]) -> ExtractedQuery {
        let started = Instant::now();
        let generation = self
            .model
            .generate(GenerationRequest {
                prompt: cleaned,
                system_instruction: self.prompts.query_extraction(),
                history,
                max_tokens: self.pipeline.query_max_tokens,
                temperature: self.pipeline.temperature,
            })
            .await;
        let extracted = ExtractedQuery::from_generation(generation);
        info!(ms = started.elapsed().as_millis() as u64, "query extraction completed");
        debug!(?extracted, "extracted query");
        extracted
    }

    async fn retrieve(&self, query: &str) -> Vec<SearchResult> {
        self.retriever.retrieve(query, self.retrieval.limit, self.retrieval.score_threshold).await
    }

    async fn generate_answer(&self, cleaned: &str, history: &[ConversationTurn], context: &str) -> Generation {
        let started = Instant::now();
        let system_instruction = self.prompts.answer_with_context(context);
        let generation = self
            .model
            .generate(GenerationRequest {
                prompt: cleaned,
                system_instruction: &system_instruction,
                history,
                max_tokens: self.pipeline.answer_max_tokens,
                temperature: self.pipeline.temperature,
            })
            .await;
        info!(ms = started.elapsed().as_millis() as u64, succeeded = generation.succeeded(), "answer generated");
        generation
    }
}

/// Final normalisation of a model answer. Blank answers become an apology.
pub fn clean_response(answer: String) -> String {
    if answer.trim().is_empty() {
        warn!("empty answer from model");
        return EMPTY_ANSWER_MESSAGE.to_string();
    }
    answer
}
