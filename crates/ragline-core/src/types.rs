//! Domain types shared by the indexer, retriever and orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A titled slice of a source document, produced by the chunker.
///
/// - `file_name`: name of the source file (no directory)
/// - `document_title`: first line of the document, or the file stem when blank
/// - `content`: trimmed, non-empty chunk text
/// - `chunk_index`: position among the surviving chunks of the document, from 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub file_name: String,
    pub document_title: String,
    pub content: String,
    pub chunk_index: usize,
}

/// Provenance stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub file_name: String,
    pub document_title: String,
    pub content: String,
    pub chunk_index: usize,
    pub content_length: usize,
    pub indexed_at: DateTime<Utc>,
}

impl ChunkPayload {
    pub fn from_chunk(chunk: DocumentChunk, indexed_at: DateTime<Utc>) -> Self {
        let content_length = chunk.content.chars().count();
        Self {
            file_name: chunk.file_name,
            document_title: chunk.document_title,
            content: chunk.content,
            chunk_index: chunk.chunk_index,
            content_length,
            indexed_at,
        }
    }
}

/// One stored vector. Owned by the vector index once upserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// A ranked match returned by a nearest-neighbour search.
///
/// `score` is a cosine similarity clamped into `[0, 1]`; higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub score: f32,
    pub file_name: String,
    pub document_title: String,
    pub content: String,
    pub chunk_index: usize,
    pub content_length: usize,
}

impl SearchResult {
    pub fn from_payload(score: f32, payload: ChunkPayload) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            file_name: payload.file_name,
            document_title: payload.document_title,
            content: payload.content,
            chunk_index: payload.chunk_index,
            content_length: payload.content_length,
        }
    }
}

/// One question/answer exchange from an earlier part of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { question: question.into(), answer: answer.into() }
    }
}

/// Which terminal state produced a [`PipelineOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    FastPath,
    Rejected,
    GatewayFailure,
    Answered,
    Error,
}

/// What a pipeline run hands back to the caller.
///
/// `sources` are exactly the results used to build the context of the answer
/// call. Runs that stop before that call (fast path, rejection, extraction
/// failure, internal fault) carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub kind: OutcomeKind,
    pub response_text: String,
    pub sources: Vec<SearchResult>,
}

impl PipelineOutcome {
    pub fn without_sources(kind: OutcomeKind, response_text: impl Into<String>) -> Self {
        Self { kind, response_text: response_text.into(), sources: Vec::new() }
    }
}
