//! Fan-out/fan-in file translation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Indexer::run                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Discovery  (Sequential):  materialise the file list        │
//! │  Translate  (Parallel):    rayon map_init, parser per worker│
//! │  Serialize  (Sequential):  header, body, trailer            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each file is translated by exactly one worker with its own parser and
//! context, so workers share nothing but the read-only file list. Outcomes
//! come back in discovery order regardless of the worker count.

use std::path::Path;

use rayon::prelude::*;
use tracing::debug;

use crate::driver::{self, FileRecord};
use crate::error::{Error, IndexError, Result};
use crate::languages::SourceParser;
use crate::languages::python::PythonLanguage;

/// Result of translating one file.
pub type FileOutcome = std::result::Result<FileRecord, IndexError>;

/// Translate every file in `files` using `workers` threads.
///
/// # Errors
///
/// Returns an error if no parser can be built or the thread pool cannot start.
/// Per-file failures are returned inside the outcomes.
pub fn translate_files(
    base: &Path,
    files: &[String],
    workers: usize,
    dump_tree: bool,
) -> Result<Vec<FileOutcome>> {
    // Fail the run up front if the grammar cannot load at all.
    let mut parser = SourceParser::new(&PythonLanguage)?;

    if workers <= 1 || files.len() <= 1 {
        debug!(files = files.len(), "Translating sequentially");
        return Ok(files
            .iter()
            .map(|path| driver::index_file(&mut parser, base, path, dump_tree))
            .collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("pyscope-worker-{i}"))
        .build()?;
    debug!(files = files.len(), workers, "Translating in parallel");

    pool.install(|| {
        files
            .par_iter()
            .map_init(
                || SourceParser::new(&PythonLanguage),
                |parser, path| index_on_worker(parser, base, path, dump_tree),
            )
            .collect()
    })
}

/// Translate one file with this worker's parser, if it could be built.
///
/// A worker without a parser fails the whole run, like the up-front check.
fn index_on_worker(
    parser: &mut Result<SourceParser>,
    base: &Path,
    path: &str,
    dump_tree: bool,
) -> Result<FileOutcome> {
    match parser {
        Ok(parser) => Ok(driver::index_file(parser, base, path, dump_tree)),
        Err(Error::Parser(message)) => Err(Error::Parser(message.clone())),
        Err(other) => Err(Error::Parser(other.to_string())),
    }
}
