//! Run configuration.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default database file name, relative to the base path.
pub const DEFAULT_OUTPUT: &str = "cscope.out";

/// Options for one indexing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    /// Directory recorded in the header; inputs and output resolve against it
    pub base: PathBuf,
    /// Files and directories to index
    pub inputs: Vec<String>,
    /// Descend into subdirectories of directory inputs
    pub recurse: bool,
    /// Worker threads; 1 runs sequentially
    pub workers: usize,
    /// Database file name, relative to `base`
    pub output: PathBuf,
    /// File listing further inputs, one per line
    pub source_list: Option<PathBuf>,
    /// Keep each file's lowered tree for inspection
    pub dump_tree: bool,
    /// Treat translation contract failures as per-file errors
    pub keep_going: bool,
}

impl IndexOptions {
    /// Defaults for indexing `base`: the whole directory, not recursive, one worker.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            inputs: Vec::new(),
            recurse: false,
            workers: 1,
            output: PathBuf::from(DEFAULT_OUTPUT),
            source_list: None,
            dump_tree: false,
            keep_going: false,
        }
    }

    /// Check the options before a run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero worker count, an empty output
    /// name, or a base path that is not a directory.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("worker count must be at least 1".to_string()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::Config("output file name is empty".to_string()));
        }
        if !self.base.is_dir() {
            return Err(Error::Config(format!(
                "base path is not a directory: {}",
                self.base.display()
            )));
        }
        Ok(())
    }

    /// Where the database is written.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.base.join(&self.output)
    }

    /// Explicit inputs followed by the source list's entries, or `.` if both are empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the source list cannot be read.
    pub fn resolved_inputs(&self) -> Result<Vec<String>> {
        let mut inputs = self.inputs.clone();
        if let Some(list) = &self.source_list {
            inputs.extend(read_source_list(list)?);
        }
        if inputs.is_empty() {
            inputs.push(".".to_string());
        }
        Ok(inputs)
    }
}

/// Paths listed one per line; blank lines are ignored.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read.
pub fn read_source_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
