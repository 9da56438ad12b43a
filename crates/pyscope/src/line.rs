//! Per-line accumulation of symbols and text.
//!
//! A [`Line`] collects the spans found on one physical source line and renders
//! them as a cscope record block:
//!
//! ```text
//! 12 def                 <- line number, first span inline when it is text
//! \t$main                <- each symbol on its own record line
//!  ( ) :                 <- following text, led by a space
//!                        <- blank line ends the block
//! ```
//!
//! Spans alternate strictly between symbols and text. Adjacent spans of the
//! same kind merge; a function-end symbol never merges and is separated from a
//! neighbouring symbol by a single-space text span.

use crate::error::TranslateError;
use crate::types::{NonSymbol, Span, Symbol};

/// The spans of one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    number: usize,
    spans: Vec<Span>,
    has_symbol: bool,
}

impl Line {
    /// Start an empty line.
    #[must_use]
    pub fn new(number: usize) -> Self {
        debug_assert!(number > 0, "line numbers are 1-indexed");
        Self {
            number,
            spans: Vec::new(),
            has_symbol: false,
        }
    }

    /// 1-indexed source line number.
    #[must_use]
    pub fn number(&self) -> usize {
        self.number
    }

    /// The accumulated spans.
    #[must_use]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Whether any symbol was appended.
    #[must_use]
    pub fn has_symbol(&self) -> bool {
        self.has_symbol
    }

    /// Append a span, merging into the trailing span when the kinds match.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::IncompatibleMerge`] when two adjacent symbols
    /// carry different marks.
    pub fn append(&mut self, span: impl Into<Span>) -> Result<(), TranslateError> {
        match span.into() {
            Span::Symbol(symbol) => {
                match self.spans.last_mut() {
                    Some(Span::Symbol(last)) if !last.is_func_end() && !symbol.is_func_end() => {
                        last.concat(&symbol)?;
                    }
                    Some(Span::Symbol(_)) => {
                        self.spans.push(Span::Text(NonSymbol::spacer()));
                        self.spans.push(Span::Symbol(symbol));
                    }
                    _ => self.spans.push(Span::Symbol(symbol)),
                }
                self.has_symbol = true;
            }
            Span::Text(text) => match self.spans.last_mut() {
                Some(Span::Text(last)) => last.concat(&text),
                _ => self.spans.push(Span::Text(text)),
            },
        }
        Ok(())
    }

    /// Render the line as a cscope record block.
    ///
    /// Returns an empty string if no symbol was ever appended.
    #[must_use]
    pub fn render(&self) -> String {
        if !self.has_symbol {
            return String::new();
        }

        let mut spans = self.spans.iter();
        let mut rows: Vec<String> = Vec::with_capacity(self.spans.len() + 1);
        match spans.next() {
            Some(Span::Symbol(symbol)) => {
                rows.push(format!("{} ", self.number));
                rows.push(symbol.to_string());
            }
            Some(Span::Text(text)) => rows.push(format!("{} {text}", self.number)),
            None => return String::new(),
        }

        for span in spans {
            match span {
                Span::Symbol(symbol) => {
                    if let Some(last) = rows.last_mut().filter(|last| last.as_str() != " ") {
                        last.push(' ');
                    }
                    rows.push(symbol.to_string());
                }
                Span::Text(text) if text.as_str() == " " => rows.push(" ".to_string()),
                Span::Text(text) => rows.push(format!(" {text}")),
            }
        }

        let mut block = rows.join("\n");
        block.push_str("\n\n");
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mark;
    use proptest::prelude::*;

    fn sym(name: &str, mark: Option<Mark>) -> Symbol {
        Symbol::new(name, mark).unwrap()
    }

    fn text(s: &str) -> NonSymbol {
        NonSymbol::new(s).unwrap()
    }

    #[test]
    fn line_without_symbols_renders_nothing() {
        let mut line = Line::new(3);
        line.append(text("pass")).unwrap();

        assert!(!line.has_symbol());
        assert_eq!(line.render(), "");
        assert_eq!(Line::new(1).render(), "");
    }

    #[test]
    fn leading_text_shares_the_line_number_row() {
        let mut line = Line::new(1);
        line.append(text("def")).unwrap();
        line.append(sym("f", Some(Mark::FuncDef))).unwrap();
        line.append(text("(")).unwrap();
        line.append(text(")")).unwrap();
        line.append(text(":")).unwrap();

        assert_eq!(line.render(), "1 def \n\t$f\n ( ) :\n\n");
    }

    #[test]
    fn leading_symbol_gets_its_own_row() {
        let mut line = Line::new(7);
        line.append(sym("a", Some(Mark::Assign))).unwrap();
        line.append(text("=")).unwrap();
        line.append(text("1")).unwrap();

        assert_eq!(line.render(), "7 \n\t=a\n = 1\n\n");
    }

    #[test]
    fn same_mark_symbols_merge_into_one_span() {
        let mut line = Line::new(1);
        line.append(text("import")).unwrap();
        line.append(sym("os", Some(Mark::Include))).unwrap();
        line.append(sym(".", Some(Mark::Include))).unwrap();
        line.append(sym("path", Some(Mark::Include))).unwrap();

        assert_eq!(line.spans().len(), 2);
        assert_eq!(line.render(), "1 import \n\t~os.path\n\n");
    }

    #[test]
    fn func_end_after_symbol_gets_a_spacer() {
        let mut line = Line::new(2);
        line.append(text("return")).unwrap();
        line.append(sym("x", None)).unwrap();
        line.append(Symbol::func_end()).unwrap();

        assert_eq!(line.spans().len(), 4);
        assert_eq!(line.render(), "2 return \nx\n \n\t}\n\n");
    }

    #[test]
    fn func_end_after_text_counts_as_symbol() {
        let mut line = Line::new(2);
        line.append(text("pass")).unwrap();
        line.append(Symbol::func_end()).unwrap();

        assert!(line.has_symbol());
        assert_eq!(line.render(), "2 pass \n\t}\n\n");
    }

    #[test]
    fn func_end_on_empty_line_leads_the_block() {
        let mut line = Line::new(9);
        line.append(Symbol::func_end()).unwrap();

        assert_eq!(line.render(), "9 \n\t}\n\n");
    }

    #[test]
    fn adjacent_symbols_with_different_marks_fail() {
        let mut line = Line::new(1);
        line.append(sym("a", Some(Mark::Assign))).unwrap();

        let result = line.append(sym("b", None));
        assert!(matches!(
            result,
            Err(TranslateError::IncompatibleMerge { .. })
        ));
    }

    fn arb_span() -> impl Strategy<Value = Span> {
        prop_oneof![
            "[a-z_][a-z0-9_]{0,6}".prop_map(|s| Span::Symbol(Symbol::new(s, None).unwrap())),
            "[a-z_][a-z0-9_]{0,6}"
                .prop_map(|s| Span::Symbol(Symbol::new(s, Some(Mark::FuncCall)).unwrap())),
            Just(Span::Symbol(Symbol::func_end())),
            "[-+*/(),:=]{1,3}".prop_map(|s| Span::Text(NonSymbol::new(s).unwrap())),
        ]
    }

    proptest! {
        #[test]
        fn render_is_empty_iff_no_symbol(number in 1usize..10_000, spans in prop::collection::vec(arb_span(), 0..12)) {
            let mut line = Line::new(number);
            for span in spans {
                // Incompatible merges are rejected without touching the line.
                let _ = line.append(span);
            }

            let rendered = line.render();
            prop_assert_eq!(rendered.is_empty(), !line.has_symbol());
            if !rendered.is_empty() {
                prop_assert!(rendered.starts_with(&number.to_string()));
                prop_assert!(rendered.ends_with("\n\n"));
                prop_assert!(!rendered.ends_with("\n\n\n"));
            }
        }

        #[test]
        fn spans_alternate_between_symbol_and_text(spans in prop::collection::vec(arb_span(), 0..12)) {
            let mut line = Line::new(1);
            for span in spans {
                let _ = line.append(span);
            }

            for pair in line.spans().windows(2) {
                prop_assert_ne!(pair[0].is_symbol(), pair[1].is_symbol());
            }
        }
    }
}
