use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Text extraction failed for {path}: {reason}")]
    Extraction { path: String, reason: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn embedding(e: impl std::fmt::Display) -> Self {
        Self::Embedding(e.to_string())
    }

    pub fn vector_store(e: impl std::fmt::Display) -> Self {
        Self::VectorStore(e.to_string())
    }
}
