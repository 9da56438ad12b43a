//! # pyscope: cscope databases for Python source
//!
//! pyscope builds a symbol cross-reference database in the cscope format from
//! Python source files, so that cscope-aware editors and browsers can jump to
//! definitions, calls, assignments and imports.
//!
//! Each file is parsed with tree-sitter, lowered into a concrete syntax tree
//! that keeps every token and layout marker, and translated in a single
//! depth-first pass. Tagging decisions are made by small lookahead rules at
//! grammar productions and consumed when the walk reaches the tagged name.
//!
//! ## Design Philosophy
//!
//! - **One pass per file** - no second walk; lookahead leaves one-shot marks
//! - **All or nothing per file** - a file that fails contributes no records
//! - **Loud on surprises** - a tree shape the rules do not model stops the run
//! - **Library first, CLI second**
//!
//! ## Quick Start
//!
//! ```no_run
//! use pyscope::{IndexOptions, Indexer};
//!
//! let mut options = IndexOptions::new("/path/to/project");
//! options.recurse = true;
//!
//! let run = Indexer::new(options)?.run()?;
//! println!("Indexed {} files", run.stats.files_indexed);
//! # Ok::<(), pyscope::Error>(())
//! ```
//!
//! Single sources can be translated without touching the file system:
//!
//! ```
//! let blocks = pyscope::translate_source("def main():\n    run()\n")?;
//! assert_eq!(blocks[0], "1 def \n\t$main\n ( ) :\n\n");
//! # Ok::<(), pyscope::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod database;
pub mod discovery;
pub mod driver;
mod error;
pub mod languages;
pub mod line;
mod parallel;
pub mod syntax;
pub mod translate;
pub mod types;

pub use config::IndexOptions;
pub use database::Database;
pub use driver::FileRecord;
pub use error::{Error, IndexError, IndexErrorKind, Result, SyntaxError, TranslateError};
pub use types::{Mark, NonSymbol, Span, Symbol};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use languages::SourceParser;
use languages::python::PythonLanguage;
use tracing::{info, warn};

/// Statistics from one indexing run.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    /// Files whose records reached the database
    pub files_indexed: usize,
    /// Files dropped because of an error
    pub files_skipped: usize,
    /// Line blocks written across all indexed files
    pub lines_emitted: usize,
    /// Wall time of discovery, translation and assembly
    pub duration: Duration,
    /// Directories that could not be listed, with the reason
    pub directories_skipped: Vec<(PathBuf, String)>,
    /// Errors for the skipped files
    pub errors: Vec<IndexError>,
}

/// Everything one run produced.
#[derive(Debug)]
pub struct IndexRun {
    /// The assembled database
    pub database: Database,
    /// Run statistics
    pub stats: IndexStats,
    /// Lowered trees per indexed file, when tree dumps were requested
    pub trees: Vec<(String, serde_json::Value)>,
}

/// Builds a cscope database from a set of inputs.
#[derive(Debug, Clone)]
pub struct Indexer {
    options: IndexOptions,
}

impl Indexer {
    /// Validate `options` and resolve the base path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid options, or [`Error::Io`] if the
    /// base path cannot be resolved.
    pub fn new(mut options: IndexOptions) -> Result<Self> {
        options.validate()?;
        options.base = options.base.canonicalize().map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("base path not found: {}", options.base.display()),
            ))
        })?;
        Ok(Self { options })
    }

    /// The validated options.
    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Discover, translate and assemble, without writing anything.
    ///
    /// Files that cannot be read or parsed are skipped and reported in
    /// [`IndexStats::errors`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invariant`] for the first file that breaks a
    /// translation contract unless [`IndexOptions::keep_going`] is set, and
    /// setup errors from the parser, worker pool or source list.
    pub fn build(&self) -> Result<IndexRun> {
        let start = Instant::now();
        let options = &self.options;

        let inputs = options.resolved_inputs()?;
        let discovered =
            discovery::discover(&options.base, &inputs, options.recurse, &PythonLanguage);
        let outcomes = parallel::translate_files(
            &options.base,
            &discovered.files,
            options.workers,
            options.dump_tree,
        )?;

        let mut database = Database::new(options.base.to_string_lossy());
        let mut stats = IndexStats {
            directories_skipped: discovered.directories_skipped,
            ..IndexStats::default()
        };
        let mut trees = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok(mut record) => {
                    stats.files_indexed += 1;
                    stats.lines_emitted += record.lines;
                    if let Some(tree) = record.tree.take() {
                        trees.push((record.path.clone(), tree));
                    }
                    database.push(&record);
                }
                Err(error) if error.kind.is_internal_error() && !options.keep_going => {
                    return Err(Error::Invariant(error));
                }
                Err(error) => {
                    warn!(
                        file = %error.path.display(),
                        kind = %error.kind,
                        error = %error.message,
                        "Skipping file"
                    );
                    stats.files_skipped += 1;
                    stats.errors.push(error);
                }
            }
        }

        stats.duration = start.elapsed();
        info!(
            files_indexed = stats.files_indexed,
            files_skipped = stats.files_skipped,
            lines = stats.lines_emitted,
            duration_ms = stats.duration.as_millis(),
            "Index built"
        );
        Ok(IndexRun {
            database,
            stats,
            trees,
        })
    }

    /// Build the database and write it to [`IndexOptions::output_path`].
    ///
    /// # Errors
    ///
    /// Everything [`build`](Self::build) returns, plus [`Error::Io`] if the
    /// database cannot be written.
    pub fn run(&self) -> Result<IndexRun> {
        let run = self.build()?;
        run.database.write(&self.options.output_path())?;
        Ok(run)
    }
}

/// Translate one in-memory source into its line blocks.
///
/// # Errors
///
/// Returns [`Error::Syntax`] if the source does not parse and
/// [`Error::Translate`] if it breaks a translation contract.
pub fn translate_source(source: &str) -> Result<Vec<String>> {
    if source.is_empty() {
        return Ok(Vec::new());
    }
    let mut parser = SourceParser::new(&PythonLanguage)?;
    let tree = parser.parse(&driver::normalise(source))?;
    Ok(translate::translate(&tree)?)
}
