//! Per-file translation state.
//!
//! A [`Context`] lives for exactly one file. It owns the line being built, the
//! finished record blocks, a one-shot memo of marks pre-assigned to name
//! terminals, and a small [`Phase`] machine for constructs that span several
//! tokens (dotted include paths, plain and augmented assignments).

use std::collections::HashMap;

use crate::error::TranslateError;
use crate::line::Line;
use crate::syntax::{NodeId, SyntaxTree, TokenKind};
use crate::types::{Mark, Span};

/// Multi-token construct currently being tagged.
///
/// Only one can be open at a time; opening a second one is a contract failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing open.
    #[default]
    Idle,
    /// Inside an import's dotted module path; names and dots are include-tagged.
    Include {
        /// Names of the path not yet seen
        segments_left: usize,
    },
    /// Inside `targets = [targets =]... value`.
    Assign {
        /// `=` tokens not yet seen
        equals_left: usize,
        /// Target groups that still owe an assign tag
        targets_left: usize,
    },
    /// Inside `target op= value`.
    CompoundAssign {
        /// Whether the target still owes an assign tag
        target_pending: bool,
    },
}

/// Translation state for one file.
#[derive(Debug)]
pub struct Context {
    output: Vec<String>,
    line: Option<Line>,
    marks: HashMap<NodeId, Mark>,
    phase: Phase,
    depth: usize,
    outer_func_depth: Option<usize>,
    import_paths_owed: usize,
    in_decorator: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Fresh state positioned on line 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            line: Some(Line::new(1)),
            marks: HashMap::new(),
            phase: Phase::Idle,
            depth: 0,
            outer_func_depth: None,
            import_paths_owed: 0,
            in_decorator: false,
        }
    }

    // === Lines ===

    /// Number of the line being built.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::LineClosed`] after end of input was committed.
    pub fn line_number(&self) -> Result<usize, TranslateError> {
        self.line
            .as_ref()
            .map(Line::number)
            .ok_or(TranslateError::LineClosed)
    }

    /// Append a span to the line being built.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::LineClosed`] after end of input, or the
    /// line's own merge failure.
    pub fn append(&mut self, span: impl Into<Span>) -> Result<(), TranslateError> {
        self.line
            .as_mut()
            .ok_or(TranslateError::LineClosed)?
            .append(span)
    }

    /// Flush the line being built and start `next`, or none at end of input.
    pub fn commit(&mut self, next: Option<usize>) {
        if let Some(line) = self.line.take() {
            let rendered = line.render();
            if !rendered.is_empty() {
                self.output.push(rendered);
            }
        }
        self.line = next.map(Line::new);
    }

    /// Consume the context, returning the rendered record blocks in order.
    #[must_use]
    pub fn into_output(self) -> Vec<String> {
        self.output
    }

    // === Mark memo ===

    /// Pre-assign `mark` to the name terminal `node`.
    ///
    /// # Errors
    ///
    /// Fails if `node` already holds a pending mark or is not a name terminal.
    pub fn set_mark(
        &mut self,
        tree: &SyntaxTree,
        node: NodeId,
        mark: Mark,
    ) -> Result<(), TranslateError> {
        if self.marks.contains_key(&node) {
            return Err(TranslateError::MarkAlreadyPending(node.index()));
        }
        if !tree.is_token(node, TokenKind::Name) {
            return Err(TranslateError::MarkOnNonName(node.index()));
        }
        self.marks.insert(node, mark);
        Ok(())
    }

    /// Whether `node` holds a pending mark.
    #[must_use]
    pub fn has_mark(&self, node: NodeId) -> bool {
        self.marks.contains_key(&node)
    }

    /// Remove and return the mark pending on `node`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::NoPendingMark`] if none was set.
    pub fn take_mark(&mut self, node: NodeId) -> Result<Mark, TranslateError> {
        self.marks
            .remove(&node)
            .ok_or(TranslateError::NoPendingMark(node.index()))
    }

    /// Marks set but never consumed.
    #[must_use]
    pub fn pending_marks(&self) -> usize {
        self.marks.len()
    }

    // === Phase machine ===

    /// The construct currently open.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Open `targets = ... value` with `equals` assignment signs.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::NestedAssignment`] if any construct is open.
    pub fn begin_assign(&mut self, equals: usize) -> Result<(), TranslateError> {
        self.require_idle()?;
        self.phase = Phase::Assign {
            equals_left: equals,
            targets_left: equals,
        };
        Ok(())
    }

    /// Open `target op= value`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::NestedAssignment`] if any construct is open.
    pub fn begin_compound_assign(&mut self) -> Result<(), TranslateError> {
        self.require_idle()?;
        self.phase = Phase::CompoundAssign {
            target_pending: true,
        };
        Ok(())
    }

    fn require_idle(&self) -> Result<(), TranslateError> {
        match self.phase {
            Phase::Idle => Ok(()),
            _ => Err(TranslateError::NestedAssignment(self.line_number()?)),
        }
    }

    /// An assignment `=` was seen.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::UnassignedTargets`] if the last `=` closes the
    /// assignment while target groups still owe a tag.
    pub fn on_equal(&mut self) -> Result<(), TranslateError> {
        let Phase::Assign {
            equals_left,
            targets_left,
        } = self.phase
        else {
            return Ok(());
        };

        let equals_left = equals_left.saturating_sub(1);
        if equals_left > 0 {
            self.phase = Phase::Assign {
                equals_left,
                targets_left,
            };
            return Ok(());
        }
        if targets_left > 0 {
            return Err(TranslateError::UnassignedTargets {
                line: self.line_number()?,
                remaining: targets_left,
            });
        }
        self.phase = Phase::Idle;
        Ok(())
    }

    /// An augmented assignment operator was seen; closes the compound assignment.
    ///
    /// # Errors
    ///
    /// Fails if no compound assignment is open or its target was never tagged.
    pub fn on_aug_assign(&mut self) -> Result<(), TranslateError> {
        match self.phase {
            Phase::CompoundAssign {
                target_pending: false,
            } => {
                self.phase = Phase::Idle;
                Ok(())
            }
            Phase::CompoundAssign {
                target_pending: true,
            } => Err(TranslateError::PendingCompoundTarget(self.line_number()?)),
            _ => Err(TranslateError::StrayCompoundOperator(self.line_number()?)),
        }
    }

    /// A comma was seen; inside an assignment it starts another target group.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::PendingCompoundTarget`] if a compound
    /// assignment target is still waiting for its tag.
    pub fn on_comma(&mut self) -> Result<(), TranslateError> {
        match self.phase {
            Phase::Assign {
                equals_left,
                targets_left,
            } => {
                self.phase = Phase::Assign {
                    equals_left,
                    targets_left: targets_left + 1,
                };
                Ok(())
            }
            Phase::CompoundAssign {
                target_pending: false,
            } => {
                self.phase = Phase::CompoundAssign {
                    target_pending: true,
                };
                Ok(())
            }
            Phase::CompoundAssign {
                target_pending: true,
            } => Err(TranslateError::PendingCompoundTarget(self.line_number()?)),
            Phase::Idle | Phase::Include { .. } => Ok(()),
        }
    }

    /// If an open assignment is waiting for the first name of a target group,
    /// claim it and return the assign mark.
    pub fn claim_assign_target(&mut self) -> Option<Mark> {
        match self.phase {
            Phase::Assign {
                equals_left,
                targets_left,
            } if targets_left > 0 && equals_left == targets_left => {
                self.phase = Phase::Assign {
                    equals_left,
                    targets_left: targets_left - 1,
                };
                Some(Mark::Assign)
            }
            Phase::CompoundAssign {
                target_pending: true,
            } => {
                self.phase = Phase::CompoundAssign {
                    target_pending: false,
                };
                Some(Mark::Assign)
            }
            _ => None,
        }
    }

    // === Imports ===

    /// Start an import statement owing `paths` dotted module paths so far.
    pub fn begin_import(&mut self, paths: usize) {
        self.import_paths_owed = paths;
    }

    /// An import name list announced `paths` more dotted module paths.
    pub fn expect_import_paths(&mut self, paths: usize) {
        self.import_paths_owed += paths;
    }

    /// Whether an import statement still owes module paths.
    #[must_use]
    pub fn in_import(&self) -> bool {
        self.import_paths_owed > 0
    }

    /// Start include-tagging a dotted module path of `segments` names.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::PhaseConflict`] if another construct is open.
    pub fn begin_include(&mut self, node: NodeId, segments: usize) -> Result<(), TranslateError> {
        if self.phase != Phase::Idle {
            return Err(TranslateError::PhaseConflict(node.index()));
        }
        self.import_paths_owed = self.import_paths_owed.saturating_sub(1);
        if segments > 0 {
            self.phase = Phase::Include {
                segments_left: segments,
            };
        }
        Ok(())
    }

    /// Whether the next name or dot belongs to an include path.
    #[must_use]
    pub fn in_include(&self) -> bool {
        matches!(self.phase, Phase::Include { .. })
    }

    /// Consume one name of the include path.
    pub fn consume_include_segment(&mut self) {
        if let Phase::Include { segments_left } = self.phase {
            self.phase = match segments_left {
                0 | 1 => Phase::Idle,
                n => Phase::Include {
                    segments_left: n - 1,
                },
            };
        }
    }

    // === Decorators ===

    /// A decorator started.
    pub fn enter_decorator(&mut self) {
        self.in_decorator = true;
    }

    /// Whether a decorator is waiting for its callee.
    #[must_use]
    pub fn in_decorator(&self) -> bool {
        self.in_decorator
    }

    /// The decorator callee was found.
    pub fn exit_decorator(&mut self) {
        self.in_decorator = false;
    }

    // === Nesting ===

    /// Current block nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether an outermost function body is open.
    #[must_use]
    pub fn in_function(&self) -> bool {
        self.outer_func_depth.is_some()
    }

    /// Remember that the outermost function opened at the current depth.
    pub fn enter_function(&mut self) {
        self.outer_func_depth = Some(self.depth);
    }

    /// A block opened.
    pub fn indent(&mut self) {
        self.depth += 1;
    }

    /// A block closed; returns `true` when it closed the outermost function.
    pub fn dedent(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        if self.outer_func_depth == Some(self.depth) {
            self.outer_func_depth = None;
            return true;
        }
        false
    }
}
