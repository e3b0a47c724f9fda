//! Question answering over an indexed document corpus: indexing, retrieval
//! and the end-to-end orchestrator.

pub mod cleaning;
pub mod context;
pub mod error;
pub mod fast_path;
pub mod indexer;
pub mod orchestrator;
pub mod prompts;
pub mod query;
pub mod retriever;

pub use cleaning::{clean_question, is_valid_question};
pub use context::{build_context, NO_EVIDENCE};
pub use error::IndexError;
pub use fast_path::FastResponses;
pub use indexer::{IndexBuildReport, IndexStatus, Indexer};
pub use orchestrator::Orchestrator;
pub use prompts::Prompts;
pub use query::ExtractedQuery;
pub use retriever::Retriever;
