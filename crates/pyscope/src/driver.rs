//! Per-file driver.
//!
//! Turns one source path into its contribution to the database body: the
//! file-boundary record followed by the record blocks of every tagged line.
//! A file either contributes completely or not at all; failures come back as
//! an [`IndexError`] carrying the file's full path so the caller can decide
//! between skipping it and aborting the run.

use std::path::Path;

use tracing::{debug, trace};

use crate::error::IndexError;
use crate::languages::SourceParser;
use crate::translate::translate;
use crate::types::Mark;

/// One file's finished contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Path as recorded in the database (relative to the base path)
    pub path: String,
    /// File-boundary record plus every rendered line block
    pub text: String,
    /// Number of line blocks emitted
    pub lines: usize,
    /// Lowered syntax tree as JSON, when requested
    pub tree: Option<serde_json::Value>,
}

/// The record opening a file's section of the body.
#[must_use]
pub fn file_boundary(path: &str) -> String {
    format!("\n{}{path}\n\n", Mark::File)
}

/// Line endings folded to `\n`, with a trailing newline guaranteed.
#[must_use]
pub fn normalise(source: &str) -> String {
    let mut text = source.replace("\r\n", "\n");
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

/// Read, parse and translate `path` (relative to `base`).
///
/// An empty file contributes only its file-boundary record.
///
/// # Errors
///
/// Returns an [`IndexError`] if the file cannot be read, is not UTF-8, does
/// not parse, or breaks a translation contract.
pub fn index_file(
    parser: &mut SourceParser,
    base: &Path,
    path: &str,
    dump_tree: bool,
) -> Result<FileRecord, IndexError> {
    let full = base.join(path);
    let bytes = std::fs::read(&full).map_err(|e| IndexError::io_error(full.clone(), &e))?;
    let source = String::from_utf8(bytes).map_err(|_| IndexError::encoding_error(full.clone()))?;

    let mut record = FileRecord {
        path: path.to_string(),
        text: file_boundary(path),
        lines: 0,
        tree: None,
    };
    if source.is_empty() {
        trace!(file = %path, "Empty file, boundary record only");
        return Ok(record);
    }

    let source = normalise(&source);
    let tree = parser
        .parse(&source)
        .map_err(|e| IndexError::parse_failed(full.clone(), e.to_string()))?;
    let blocks = translate(&tree).map_err(|e| IndexError::invariant(full.clone(), &e))?;

    if dump_tree {
        record.tree = Some(tree.to_json(tree.root()));
    }
    record.lines = blocks.len();
    for block in &blocks {
        record.text.push_str(block);
    }

    debug!(
        file = %path,
        nodes = tree.len(),
        lines = record.lines,
        "Translated file"
    );
    Ok(record)
}
