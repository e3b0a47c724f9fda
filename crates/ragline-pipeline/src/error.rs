use std::path::PathBuf;

use thiserror::Error;

/// Indexing failures that abort a build outright. Everything else is reported
/// through [`crate::indexer::IndexBuildReport`].
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Documents folder not found: {}", .0.display())]
    MissingFolder(PathBuf),
}
