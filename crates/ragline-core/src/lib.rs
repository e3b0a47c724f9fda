#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod traits;
pub mod types;

pub use chunker::{chunk, chunk_document, DocumentProcessor, FolderScan, CHUNK_BOUNDARY};
pub use config::{Config, Settings};
pub use error::{Error, Result};
pub use traits::{Embedder, Generation, GenerationRequest, LanguageModel, VectorIndex};
pub use types::{
    ChunkPayload, ConversationTurn, DocumentChunk, IndexedPoint, OutcomeKind, PipelineOutcome, SearchResult,
};
