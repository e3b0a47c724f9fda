//! Document chunking: a title line followed by marker-separated chunks.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::extract::{extract_text, DocumentKind};
use crate::types::DocumentChunk;

/// Separates chunks inside a prepared source document.
pub const CHUNK_BOUNDARY: &str = "---CHUNK_BOUNDARY---";

/// Split raw document text into its title and ordered, non-empty chunks.
///
/// The first line is the title; when it is blank the file stem stands in.
/// Everything after it is split on [`CHUNK_BOUNDARY`], each piece trimmed, and
/// empty pieces dropped. Text without a marker yields a single chunk.
pub fn chunk(raw_text: &str, file_name: &str) -> (String, Vec<String>) {
    let (first_line, rest) = raw_text.split_once('\n').unwrap_or((raw_text, ""));
    let title = match first_line.trim() {
        "" => fallback_title(file_name),
        line => line.to_string(),
    };
    let chunks = rest
        .split(CHUNK_BOUNDARY)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    (title, chunks)
}

fn fallback_title(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(file_name)
        .to_string()
}

/// [`chunk`] one document into [`DocumentChunk`]s indexed from 0.
pub fn chunk_document(raw_text: &str, file_name: &str) -> Vec<DocumentChunk> {
    if raw_text.trim().is_empty() {
        warn!(file = file_name, "no text extracted; document skipped");
        return Vec::new();
    }
    let (title, chunks) = chunk(raw_text, file_name);
    chunks
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| DocumentChunk {
            file_name: file_name.to_string(),
            document_title: title.clone(),
            content,
            chunk_index,
        })
        .collect()
}

/// Outcome of scanning a documents folder.
#[derive(Debug, Default)]
pub struct FolderScan {
    pub chunks: Vec<DocumentChunk>,
    pub documents: usize,
    pub skipped: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentProcessor;

impl DocumentProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Extract and chunk every supported file directly inside `folder`.
    ///
    /// Files are visited in name order. A file that fails to extract is logged
    /// and skipped; only a missing folder is an error.
    pub fn process_folder(&self, folder: &Path) -> Result<FolderScan> {
        if !folder.is_dir() {
            return Err(Error::NotFound(format!("documents folder {}", folder.display())));
        }

        let mut scan = FolderScan::default();
        let entries = WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());

        for entry in entries {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            if DocumentKind::from_path(path).is_none() {
                debug!(file = %file_name, "unsupported file type; skipped");
                continue;
            }
            match extract_text(path) {
                Ok(Some(text)) => {
                    let chunks = chunk_document(&text, &file_name);
                    debug!(file = %file_name, chunks = chunks.len(), "document chunked");
                    scan.documents += 1;
                    scan.chunks.extend(chunks);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(file = %file_name, error = %e, "extraction failed; document skipped");
                    scan.skipped += 1;
                }
            }
        }

        info!(
            folder = %folder.display(),
            documents = scan.documents,
            skipped = scan.skipped,
            chunks = scan.chunks.len(),
            "documents processed"
        );
        Ok(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_then_marker_separated_chunks() {
        let text = format!("Phone Guide\nBattery info{CHUNK_BOUNDARY}  Screen info \n{CHUNK_BOUNDARY}\n");
        let (title, chunks) = chunk(&text, "phone.pdf");
        assert_eq!(title, "Phone Guide");
        assert_eq!(chunks, vec!["Battery info", "Screen info"]);
    }

    #[test]
    fn no_marker_is_one_chunk() {
        let (_, chunks) = chunk("Title\nline one\nline two", "x.txt");
        assert_eq!(chunks, vec!["line one\nline two"]);
    }

    #[test]
    fn blank_first_line_falls_back_to_file_stem() {
        let (title, chunks) = chunk("   \nbody", "returns-policy.docx");
        assert_eq!(title, "returns-policy");
        assert_eq!(chunks, vec!["body"]);
    }

    #[test]
    fn title_only_document_has_no_chunks() {
        let (title, chunks) = chunk("Just a title", "t.txt");
        assert_eq!(title, "Just a title");
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunk_indices_count_surviving_chunks() {
        let text = format!("T\n{CHUNK_BOUNDARY}a{CHUNK_BOUNDARY}   {CHUNK_BOUNDARY}b");
        let chunks = chunk_document(&text, "doc.md");
        let indices: Vec<_> = chunks.iter().map(|c| (c.chunk_index, c.content.as_str())).collect();
        assert_eq!(indices, vec![(0, "a"), (1, "b")]);
        assert!(chunks.iter().all(|c| c.document_title == "T" && c.file_name == "doc.md"));
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(chunk_document("  \n ", "empty.pdf").is_empty());
    }
}
