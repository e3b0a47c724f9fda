//! Raw text extraction for the document types the indexer understands.

use std::fs;
use std::io::Read;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    /// Classify by extension (case-insensitive). `None` means unsupported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "md" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Extract the text of a supported document.
///
/// Returns `Ok(None)` for unsupported file types; those are skipped, not errors.
pub fn extract_text(path: &Path) -> Result<Option<String>> {
    let Some(kind) = DocumentKind::from_path(path) else {
        return Ok(None);
    };
    let text = match kind {
        DocumentKind::Pdf => extract_pdf(path)?,
        DocumentKind::Docx => extract_docx(path)?,
        DocumentKind::PlainText => {
            let bytes = fs::read(path)?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
    };
    Ok(Some(text))
}

fn extraction_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::Extraction { path: path.display().to_string(), reason: reason.to_string() }
}

fn extract_pdf(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    // pdf-extract panics on some malformed inputs.
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
        .map_err(|_| extraction_error(path, "PDF parser panicked"))?
        .map_err(|e| extraction_error(path, e))?;
    Ok(text.trim().to_string())
}

fn extract_docx(path: &Path) -> Result<String> {
    let file = fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| extraction_error(path, e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| extraction_error(path, e))?
        .read_to_string(&mut xml)?;
    let paragraphs = docx_paragraphs(&xml).map_err(|e| extraction_error(path, e))?;
    Ok(paragraphs.join("\n"))
}

/// Non-empty paragraphs of a WordprocessingML body, in document order.
///
/// Run tabs become `\t` and line breaks `\n`; tab stop definitions in
/// paragraph properties carry attributes and are ignored.
pub fn docx_paragraphs(xml: &str) -> std::result::Result<Vec<String>, regex::Error> {
    let run_content = Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:(tab|br|cr)\s*/>|<w:br\s+w:type=[^>]*/>")?;
    Ok(xml
        .split("</w:p>")
        .map(|paragraph| {
            run_content
                .captures_iter(paragraph)
                .map(|c| match (c.get(1), c.get(2).map(|m| m.as_str())) {
                    (Some(text), _) => unescape_xml(text.as_str()),
                    (None, Some("tab")) => "\t".to_string(),
                    _ => "\n".to_string(),
                })
                .collect::<String>()
        })
        .filter(|p| !p.trim().is_empty())
        .collect())
}

/// Decode the predefined XML entities and numeric character references.
/// Anything unrecognised is kept verbatim.
fn unescape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
