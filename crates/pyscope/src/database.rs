//! cscope database serializer.
//!
//! The database has three regions:
//!
//! ```text
//! cscope 15 <base> -c <10-digit offset>     header, no newline
//! \n\t@a.py\n\n<blocks>...\n\t@             body, closed by a bare file mark
//! \n1\n.\n0\n<count>\n<len>\n<paths>        trailer
//! ```
//!
//! The offset in the header is the byte position of the trailer's first
//! line (the `1` after the body's closing mark).

use std::path::Path;

use tracing::debug;

use crate::driver::FileRecord;
use crate::error::Result;
use crate::types::Mark;

/// Bytes of the header that do not depend on the base path.
const HEADER_FIXED_LEN: usize = 25;

/// Database contents accumulated file by file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Database {
    base: String,
    body: String,
    paths: Vec<String>,
}

impl Database {
    /// An empty database rooted at `base`.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            body: String::new(),
            paths: Vec::new(),
        }
    }

    /// Append one file's records.
    pub fn push(&mut self, record: &FileRecord) {
        self.body.push_str(&record.text);
        self.paths.push(record.path.clone());
    }

    /// Number of files recorded.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.paths.len()
    }

    /// Paths in the order their records appear.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// The complete database file.
    #[must_use]
    pub fn render(&self) -> String {
        let body = format!("{}\n{}", self.body, Mark::File);
        let offset = self.base.len() + HEADER_FIXED_LEN + body.len();

        let mut names = self.paths.join("\n");
        names.push('\n');

        let trailer = format!("\n1\n.\n0\n{}\n{}\n{names}", self.paths.len(), names.len());
        let mut out = format!("cscope 15 {} -c {offset:010}", self.base);
        out.reserve(body.len() + trailer.len());
        out.push_str(&body);
        out.push_str(&trailer);
        out
    }

    /// Render and write the database to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<()> {
        let rendered = self.render();
        std::fs::write(path, &rendered)?;
        debug!(
            path = %path.display(),
            bytes = rendered.len(),
            files = self.paths.len(),
            "Wrote database"
        );
        Ok(())
    }
}
