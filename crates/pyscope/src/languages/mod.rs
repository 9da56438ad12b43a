//! Language front ends that turn source text into a [`SyntaxTree`].
//!
//! Each supported language implements the `LanguageSupport` trait, which
//! defines which files it claims and how a tree-sitter parse is lowered into
//! the concrete tree the translator walks.
//!
//! ## Adding a New Language
//!
//! 1. Create a new module (e.g., `ruby.rs`)
//! 2. Implement `LanguageSupport` trait
//! 3. Hand a `&'static` instance to [`SourceParser::new`]

pub mod python;
mod tree_sitter_utils;

use crate::error::{Error, Result, SyntaxError};
use crate::syntax::SyntaxTree;

/// Trait for language-specific parse-tree lowering.
pub trait LanguageSupport: Send + Sync {
    /// File extensions this language handles, without the leading dot.
    fn extensions(&self) -> &[&str];

    /// Get the tree-sitter language for parsing.
    fn tree_sitter_language(&self) -> tree_sitter::Language;

    /// Lower a tree-sitter parse of `source` into a concrete syntax tree.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError`] if the parse contains error or missing nodes.
    fn lower(
        &self,
        tree: &tree_sitter::Tree,
        source: &str,
    ) -> std::result::Result<SyntaxTree, SyntaxError>;

    /// Whether a file name ends in one of [`extensions`](Self::extensions).
    fn handles(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| self.extensions().contains(&ext))
    }
}

/// A reusable tree-sitter parser bound to one language.
///
/// Parsers are not shareable across threads; each worker owns one.
pub struct SourceParser {
    parser: tree_sitter::Parser,
    language: &'static dyn LanguageSupport,
}

impl SourceParser {
    /// Create a parser for `language`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parser`] if tree-sitter rejects the grammar (ABI mismatch).
    pub fn new(language: &'static dyn LanguageSupport) -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&language.tree_sitter_language())
            .map_err(|e| Error::Parser(e.to_string()))?;
        Ok(Self { parser, language })
    }

    /// The language this parser was built for.
    #[must_use]
    pub fn language(&self) -> &'static dyn LanguageSupport {
        self.language
    }

    /// Parse and lower `source`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError`] if the source does not parse cleanly.
    pub fn parse(&mut self, source: &str) -> std::result::Result<SyntaxTree, SyntaxError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(SyntaxError::NoTree)?;
        self.language.lower(&tree, source)
    }
}

impl std::fmt::Debug for SourceParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceParser")
            .field("extensions", &self.language.extensions())
            .finish_non_exhaustive()
    }
}
