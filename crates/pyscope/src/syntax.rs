//! Concrete syntax tree consumed by the translator.
//!
//! The tree keeps every token of the source, punctuation included, because the
//! line model reproduces it verbatim. Nodes live in an arena and are addressed
//! by [`NodeId`], a stable index that the translation context uses to key its
//! one-shot mark memo.
//!
//! Language front ends (see [`crate::languages`]) build trees with
//! [`TreeBuilder`]; the translator only ever reads them.

use serde::Serialize;
use serde_json::{Map, Value, json};

/// Stable index of a node in its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Extract the raw index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Token kinds the dispatch rules distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Identifier
    Name,
    /// Reserved word or literal keyword (`def`, `None`, ...)
    Keyword,
    /// A complete string literal
    String,
    /// Numeric literal
    Number,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `=`
    Equal,
    /// Augmented assignment operator (`+=`, `//=`, ...)
    AugAssign,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// Any other punctuation or operator
    Operator,
    /// End of a logical line
    Newline,
    /// Start of an indented block
    Indent,
    /// End of an indented block
    Dedent,
    /// End of input
    EndMarker,
}

/// A leaf of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// What kind of token this is
    pub kind: TokenKind,
    /// Literal source text (empty for synthesized layout tokens)
    pub text: String,
    /// 1-indexed line on which the token ends
    pub line: usize,
}

/// Grammar productions the dispatch rules recognize.
///
/// Anything the rules do not care about is [`Production::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Production {
    /// Whole file
    Module,
    /// `[decorators] [async] def name(...) ...`
    FuncDef,
    /// `[decorators] class name ...`
    ClassDef,
    /// Decorator list preceding a definition
    Decorators,
    /// `@ dotted_name [(args)] NEWLINE`
    Decorator,
    /// `global a, b`
    GlobalStmt,
    /// `import ...` or `from ... import ...`
    ImportStmt,
    /// Comma-separated modules of an `import` statement
    DottedAsNames,
    /// `name(.name)*` path
    DottedName,
    /// Assignment or augmented assignment statement
    ExprStmt,
    /// Primary expression followed by trailers
    Power,
    /// `(...)`, `[...]` or `.name` following a primary
    Trailer,
    /// Any other grouping
    Other,
}

impl Production {
    /// Name used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::FuncDef => "funcdef",
            Self::ClassDef => "classdef",
            Self::Decorators => "decorators",
            Self::Decorator => "decorator",
            Self::GlobalStmt => "global_stmt",
            Self::ImportStmt => "import_stmt",
            Self::DottedAsNames => "dotted_as_names",
            Self::DottedName => "dotted_name",
            Self::ExprStmt => "expr_stmt",
            Self::Power => "power",
            Self::Trailer => "trailer",
            Self::Other => "other",
        }
    }
}

/// A tree node: a token or a production with ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Leaf
    Terminal(Token),
    /// Interior node
    NonTerminal {
        /// Which production this node is
        production: Production,
        /// Children, left to right
        children: Vec<NodeId>,
    },
}

/// An immutable concrete syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SyntaxTree {
    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree's builder.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The token at `id`, if it is a terminal.
    #[must_use]
    pub fn token(&self, id: NodeId) -> Option<&Token> {
        match self.node(id) {
            Node::Terminal(token) => Some(token),
            Node::NonTerminal { .. } => None,
        }
    }

    /// The production at `id`, if it is a non-terminal.
    #[must_use]
    pub fn production(&self, id: NodeId) -> Option<Production> {
        match self.node(id) {
            Node::Terminal(_) => None,
            Node::NonTerminal { production, .. } => Some(*production),
        }
    }

    /// Children of `id` (empty for terminals).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Node::Terminal(_) => &[],
            Node::NonTerminal { children, .. } => children,
        }
    }

    /// Whether `id` is a token of the given kind.
    #[must_use]
    pub fn is_token(&self, id: NodeId, kind: TokenKind) -> bool {
        self.token(id).is_some_and(|t| t.kind == kind)
    }

    /// Whether `id` is a keyword token with the given text.
    #[must_use]
    pub fn is_keyword(&self, id: NodeId, text: &str) -> bool {
        self.token(id)
            .is_some_and(|t| t.kind == TokenKind::Keyword && t.text == text)
    }

    /// Nested JSON rendering of the subtree at `id`, for debugging dumps.
    #[must_use]
    pub fn to_json(&self, id: NodeId) -> Value {
        // (node, children already rendered)
        let mut stack = vec![(id, false)];
        let mut done: Vec<Value> = Vec::new();
        while let Some((id, expanded)) = stack.pop() {
            match self.node(id) {
                Node::Terminal(token) => done.push(json!({
                    "id": id,
                    "token": token.kind,
                    "text": token.text,
                    "line": token.line,
                })),
                Node::NonTerminal { children, .. } if !expanded => {
                    stack.push((id, true));
                    stack.extend(children.iter().rev().map(|&child| (child, false)));
                }
                Node::NonTerminal {
                    production,
                    children,
                } => {
                    let rendered = done.split_off(done.len().saturating_sub(children.len()));
                    let mut object = Map::new();
                    object.insert("id".to_owned(), json!(id));
                    object.insert("production".to_owned(), json!(production));
                    object.insert("children".to_owned(), Value::Array(rendered));
                    done.push(Value::Object(object));
                }
            }
        }
        done.pop().unwrap_or(Value::Null)
    }
}

/// Incremental arena builder for [`SyntaxTree`].
///
/// Children must be built before their parent, so node ids follow a
/// post-order numbering.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a terminal.
    pub fn token(&mut self, kind: TokenKind, text: impl Into<String>, line: usize) -> NodeId {
        self.push(Node::Terminal(Token {
            kind,
            text: text.into(),
            line,
        }))
    }

    /// Add a non-terminal over already-built children.
    pub fn non_terminal(&mut self, production: Production, children: Vec<NodeId>) -> NodeId {
        self.push(Node::NonTerminal {
            production,
            children,
        })
    }

    /// Finish the tree with `root` as its root.
    #[must_use]
    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            root,
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}
