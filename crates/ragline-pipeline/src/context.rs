//! Assembly of the evidence block handed to the answer model.

use ragline_core::types::SearchResult;

/// Context used when retrieval produced no evidence.
pub const NO_EVIDENCE: &str = "No relevant information found in the knowledge base.";

struct SourceBlock<'a> {
    file_name: &'a str,
    document_title: &'a str,
    contents: Vec<&'a str>,
}

/// Group results by file in first-seen rank order, one numbered block per
/// distinct file. Later chunks of a file are appended to its block.
pub fn build_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_EVIDENCE.to_string();
    }

    let mut blocks: Vec<SourceBlock<'_>> = Vec::new();
    for result in results {
        match blocks.iter_mut().find(|b| b.file_name == result.file_name) {
            Some(block) => block.contents.push(&result.content),
            None => blocks.push(SourceBlock {
                file_name: &result.file_name,
                document_title: &result.document_title,
                contents: vec![&result.content],
            }),
        }
    }

    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            format!(
                "--- Document Source {} ---\nFile: {}\nTitle: {}\nContent: {}\n\n",
                i + 1,
                block.file_name,
                block.document_title,
                block.contents.join("\n\n")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
