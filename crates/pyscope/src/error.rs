//! Error types for pyscope operations.
//!
//! Errors come in three layers:
//!
//! - **`Error`**: Top-level errors that halt the run (I/O on the output file,
//!   parser or worker setup, bad configuration, broken translation contracts)
//! - **`IndexError`**: File-level errors that are collected but don't halt indexing
//! - **`TranslateError`**: A broken contract inside the tag/line model or the
//!   translation context, raised while walking one file's tree
//!
//! ## Error Philosophy
//!
//! Indexing is "best effort" for input problems:
//! - A file that does not parse is reported and dropped, the rest still index
//! - No partial records from a failed file ever reach the database
//!
//! A `TranslateError` means the tree had a shape the dispatch rules do not
//! model. Continuing could emit misaligned tags, so by default it stops the run.
//!
//! ## Error Categorization
//!
//! `IndexErrorKind` uses a 4xx/5xx style categorization:
//! - Input problems (user's fault): parse errors, encoding, unreadable files
//! - Internal problems (our fault): invariant violations during translation

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pyscope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for pyscope operations.
///
/// These errors represent failures that prevent the run from completing.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tree-sitter parsing infrastructure failed
    #[error("parser error: {0}")]
    Parser(String),

    /// Invalid configuration or arguments
    #[error("configuration error: {0}")]
    Config(String),

    /// The worker thread pool could not start
    #[error("worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// In-memory source did not parse
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// In-memory source broke a translation contract
    #[error("translation error: {0}")]
    Translate(#[from] TranslateError),

    /// A file broke a translation contract and the run was not told to keep going
    #[error("invariant violation: {0}")]
    Invariant(IndexError),
}

/// Error encountered while indexing a specific file.
///
/// These errors are collected during indexing but don't halt the operation.
/// The indexer continues with remaining files and reports all errors at the end.
#[derive(Debug, Clone)]
pub struct IndexError {
    /// Path to the file that failed, as it appears in the database
    pub path: PathBuf,
    /// Category of the error
    pub kind: IndexErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.path.display(),
            self.message,
            self.kind
        )
    }
}

impl std::error::Error for IndexError {}

/// Categorization of indexing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorKind {
    // === Input Problems (analogous to HTTP 4xx) ===
    /// Source file has syntax errors that prevent parsing
    ParseFailed,

    /// File content is not valid UTF-8
    EncodingError,

    /// Could not read the file from disk
    IoError,

    // === Internal Problems (analogous to HTTP 5xx) ===
    /// The file's tree has a shape outside the modeled grammar
    InvariantViolation,
}

impl std::fmt::Display for IndexErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseFailed => write!(f, "parse failed"),
            Self::EncodingError => write!(f, "encoding error"),
            Self::IoError => write!(f, "I/O error"),
            Self::InvariantViolation => write!(f, "invariant violation"),
        }
    }
}

impl IndexErrorKind {
    /// Returns `true` if this is an input problem (4xx-style).
    ///
    /// Input problems are issues with the source files that the user can fix.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::ParseFailed | Self::EncodingError | Self::IoError)
    }

    /// Returns `true` if this is an internal problem (5xx-style).
    #[must_use]
    pub fn is_internal_error(&self) -> bool {
        matches!(self, Self::InvariantViolation)
    }
}

impl IndexError {
    /// Create a new indexing error.
    #[must_use]
    pub fn new(path: PathBuf, kind: IndexErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    /// Create a parse error for a file.
    #[must_use]
    pub fn parse_failed(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(path, IndexErrorKind::ParseFailed, message)
    }

    /// Create an encoding error for a file.
    #[must_use]
    pub fn encoding_error(path: PathBuf) -> Self {
        Self::new(
            path,
            IndexErrorKind::EncodingError,
            "file is not valid UTF-8",
        )
    }

    /// Create an I/O error for a file.
    #[must_use]
    pub fn io_error(path: PathBuf, error: &std::io::Error) -> Self {
        Self::new(path, IndexErrorKind::IoError, error.to_string())
    }

    /// Attach a file path to a translation contract failure.
    #[must_use]
    pub fn invariant(path: PathBuf, error: &TranslateError) -> Self {
        Self::new(path, IndexErrorKind::InvariantViolation, error.to_string())
    }
}

/// Why a source file could not be turned into a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// The parse contains an error or missing node
    #[error("invalid syntax at line {line}, column {column}")]
    Invalid {
        /// 1-indexed line of the first error node
        line: usize,
        /// 1-indexed column of the first error node
        column: usize,
    },

    /// tree-sitter returned no tree at all
    #[error("parser produced no tree")]
    NoTree,
}

/// A broken contract in the tag model, line model, or translation context.
///
/// Every variant signals a tree shape that the dispatch rules do not model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// A mark character outside the cscope vocabulary
    #[error("not a valid mark: {0:?}")]
    InvalidTag(char),

    /// Symbols need a name unless they mark a function end
    #[error("symbol name must not be empty unless it marks a function end")]
    EmptySymbol,

    /// Untagged spans need text
    #[error("non-symbol text must not be empty")]
    EmptyText,

    /// Two adjacent symbols carry different marks
    #[error("cannot merge symbol {left:?} with {right:?}: marks differ")]
    IncompatibleMerge {
        /// Rendered left symbol
        left: String,
        /// Rendered right symbol
        right: String,
    },

    /// A node was marked twice before its terminal was reached
    #[error("node {0} already holds a pending mark")]
    MarkAlreadyPending(usize),

    /// Only name terminals can be pre-marked
    #[error("node {0} is not a name terminal and cannot hold a mark")]
    MarkOnNonName(usize),

    /// A mark was read that was never set
    #[error("node {0} has no pending mark")]
    NoPendingMark(usize),

    /// An assignment started while another was still open
    #[error("nested assignment statement at line {0}")]
    NestedAssignment(usize),

    /// The last `=` of an assignment arrived with targets still untagged
    #[error("assignment closed at line {line} with {remaining} target(s) unassigned")]
    UnassignedTargets {
        /// Line of the closing `=`
        line: usize,
        /// Targets still waiting for a tag
        remaining: usize,
    },

    /// An augmented operator arrived with no compound assignment open
    #[error("augmented assignment operator at line {0} without an open compound assignment")]
    StrayCompoundOperator(usize),

    /// An augmented operator arrived while a target still waited for its tag
    #[error("augmented assignment operator at line {0} with a target still pending")]
    PendingCompoundTarget(usize),

    /// A dotted include path started while another phase was open
    #[error("dotted name at node {0} started while another construct was open")]
    PhaseConflict(usize),

    /// A token arrived after end of input was committed
    #[error("token after end of input")]
    LineClosed,

    /// A production did not have the children its rule requires
    #[error("unexpected {production} shape at node {node}")]
    UnexpectedShape {
        /// Production name
        production: &'static str,
        /// Offending node
        node: usize,
    },
}
