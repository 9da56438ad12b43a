//! Tag model for the cscope symbol database.
//!
//! The database is a sequence of text fragments. Some fragments are *symbols*
//! that a browser can jump to, optionally tagged with a one-character [`Mark`]
//! saying what the occurrence means; everything else is plain text that the
//! browser displays around them.
//!
//! - **`Mark`**: The closed cscope tag vocabulary
//! - **`Symbol`**: A named token with at most one mark
//! - **`NonSymbol`**: Untagged text between symbols
//! - **`Span`**: Either of the two, as stored in a [`Line`](crate::line::Line)

use std::fmt;

use crate::error::TranslateError;

/// A cscope mark.
///
/// Rendered as a tab followed by the mark character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    /// Start of a file's records (`@`)
    File,
    /// Function definition (`$`)
    FuncDef,
    /// Function call (`` ` ``)
    FuncCall,
    /// End of a function body (`}`)
    FuncEnd,
    /// Import of a module (`~`)
    Include,
    /// Direct or augmented assignment (`=`)
    Assign,
    /// Class definition (`c`)
    Class,
    /// Other global definition (`g`)
    OtherGlobal,
    /// Function or block local definition (`l`)
    Local,
}

impl Mark {
    /// Every mark, in cscope's documentation order.
    pub const ALL: [Mark; 9] = [
        Mark::File,
        Mark::FuncDef,
        Mark::FuncCall,
        Mark::FuncEnd,
        Mark::Include,
        Mark::Assign,
        Mark::Class,
        Mark::OtherGlobal,
        Mark::Local,
    ];

    /// The character cscope uses for this mark.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::File => '@',
            Self::FuncDef => '$',
            Self::FuncCall => '`',
            Self::FuncEnd => '}',
            Self::Include => '~',
            Self::Assign => '=',
            Self::Class => 'c',
            Self::OtherGlobal => 'g',
            Self::Local => 'l',
        }
    }
}

impl TryFrom<char> for Mark {
    type Error = TranslateError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Mark::ALL
            .into_iter()
            .find(|mark| mark.as_char() == c)
            .ok_or(TranslateError::InvalidTag(c))
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\t{}", self.as_char())
    }
}

/// A symbol as cscope understands it: a name, optionally tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    name: String,
    mark: Option<Mark>,
}

impl Symbol {
    /// Create a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::EmptySymbol`] if `name` is empty; only the
    /// function-end placeholder (see [`Symbol::func_end`]) may have no name.
    pub fn new(name: impl Into<String>, mark: Option<Mark>) -> Result<Self, TranslateError> {
        let name = name.into();
        if name.is_empty() && mark != Some(Mark::FuncEnd) {
            return Err(TranslateError::EmptySymbol);
        }
        Ok(Self { name, mark })
    }

    /// The nameless symbol closing a function body.
    #[must_use]
    pub fn func_end() -> Self {
        Self {
            name: String::new(),
            mark: Some(Mark::FuncEnd),
        }
    }

    /// The symbol's literal text.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The symbol's mark, if tagged.
    #[must_use]
    pub fn mark(&self) -> Option<Mark> {
        self.mark
    }

    /// Whether this is the function-end placeholder.
    #[must_use]
    pub fn is_func_end(&self) -> bool {
        self.mark == Some(Mark::FuncEnd)
    }

    /// Append another symbol's text, forming one multi-token name (`os.path`).
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::IncompatibleMerge`] if the marks differ.
    pub fn concat(&mut self, other: &Symbol) -> Result<(), TranslateError> {
        if self.mark != other.mark {
            return Err(TranslateError::IncompatibleMerge {
                left: self.to_string(),
                right: other.to_string(),
            });
        }
        self.name.push_str(&other.name);
        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(mark) = self.mark {
            write!(f, "{mark}")?;
        }
        f.write_str(&self.name)
    }
}

/// Untagged text between symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonSymbol {
    text: String,
}

impl NonSymbol {
    /// Create a text span.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::EmptyText`] if `text` is empty.
    pub fn new(text: impl Into<String>) -> Result<Self, TranslateError> {
        let text = text.into();
        if text.is_empty() {
            return Err(TranslateError::EmptyText);
        }
        Ok(Self { text })
    }

    /// The single space separating two adjacent symbols.
    #[must_use]
    pub fn spacer() -> Self {
        Self {
            text: " ".to_string(),
        }
    }

    /// The stored text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Append another span's text, separated by one space.
    pub fn concat(&mut self, other: &NonSymbol) {
        self.text.push(' ');
        self.text.push_str(&other.text);
    }
}

impl fmt::Display for NonSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One piece of a source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// A symbol, tagged or not
    Symbol(Symbol),
    /// Plain text
    Text(NonSymbol),
}

impl Span {
    /// Whether this span is a symbol.
    #[must_use]
    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }
}

impl From<Symbol> for Span {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl From<NonSymbol> for Span {
    fn from(text: NonSymbol) -> Self {
        Self::Text(text)
    }
}
