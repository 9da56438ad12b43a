//! Python front end.
//!
//! tree-sitter-python produces a tree tuned for editors: comments are nodes,
//! layout is implicit, and calls or assignments nest right-to-left. The
//! translator instead expects the classic tokenizer view of a Python file,
//! so this module lowers the parse into that shape:
//!
//! - every simple statement ends with a `Newline` token, as does every decorator
//! - an indented suite is `Newline Indent <statements> Dedent`
//! - the file ends with an `EndMarker` one line past the last line
//! - call, attribute and subscript chains flatten into `Power(primary, Trailer*)`
//! - chained and augmented assignments flatten into one `ExprStmt`
//! - `a + b + c` and `a or b or c` chains flatten into one group
//! - import module paths and decorator callees become `DottedName` nodes
//!
//! Only the `=` of an assignment statement is an `Equal` token. The `=` of a
//! keyword argument or default parameter is a plain operator, and so is a
//! comma inside a variable annotation.
//!
//! Lowering runs on an explicit work stack, so nesting depth in the source
//! never turns into call depth.

use tree_sitter::Node;

use super::LanguageSupport;
use super::tree_sitter_utils::{end_line, first_error, node_text, significant_children, start_line};
use crate::error::SyntaxError;
use crate::syntax::{NodeId, Production, SyntaxTree, TokenKind, TreeBuilder};

/// Statements whose body is a suite and therefore carry no trailing `Newline`.
const COMPOUND_STATEMENTS: &[&str] = &[
    "function_definition",
    "class_definition",
    "decorated_definition",
    "if_statement",
    "for_statement",
    "while_statement",
    "try_statement",
    "with_statement",
    "match_statement",
    "case_clause",
];

/// Left-nested operator chains lowered as one flat group.
const OPERATOR_CHAINS: &[&str] = &["binary_operator", "boolean_operator"];

/// Python language support.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonLanguage;

impl LanguageSupport for PythonLanguage {
    fn extensions(&self) -> &[&str] {
        &["py"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn lower(&self, tree: &tree_sitter::Tree, source: &str) -> Result<SyntaxTree, SyntaxError> {
        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = first_error(root).map_or((1, 1), |node| {
                let at = node.start_position();
                (at.row + 1, at.column + 1)
            });
            return Err(SyntaxError::Invalid { line, column });
        }

        let mut lowering = Lowering {
            source,
            builder: TreeBuilder::new(),
        };
        let module = lowering.module(root);
        let module = lowering.run(module);
        Ok(lowering.builder.finish(module))
    }
}

/// Where a node sits, as far as token classification cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Code,
    /// Inside `: T` of an annotated assignment; commas do not separate targets.
    Annotation,
}

/// Pending lowering work. Every task except `Close` yields exactly one node.
enum Task<'t> {
    /// Any expression or clause.
    Node(Node<'t>, Scope),
    /// A statement of a module or block.
    Statement(Node<'t>),
    /// A leaf, classified by its kind and text.
    Leaf(Node<'t>, Scope),
    /// A leaf with a fixed token kind.
    Token(Node<'t>, TokenKind),
    /// A synthesized layout token with no text.
    Layout(TokenKind, usize),
    /// A non-terminal over the nodes its child tasks yield.
    Build(Production, Vec<Task<'t>>),
    /// Collect the last `n` yielded nodes under a non-terminal.
    Close(Production, usize),
}

struct Lowering<'s> {
    source: &'s str,
    builder: TreeBuilder,
}

impl Lowering<'_> {
    /// Drain the work stack starting from `root` and return the node it yields.
    fn run(&mut self, root: Task<'_>) -> NodeId {
        let mut tasks = vec![root];
        let mut done: Vec<NodeId> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Node(node, scope) => tasks.push(expression(node, scope)),
                Task::Statement(node) => tasks.push(statement(node)),
                Task::Leaf(node, scope) => done.push(self.leaf(&node, scope)),
                Task::Token(node, kind) => done.push(self.token(&node, kind)),
                Task::Layout(kind, line) => done.push(self.builder.token(kind, "", line)),
                Task::Build(production, children) => {
                    tasks.push(Task::Close(production, children.len()));
                    tasks.extend(children.into_iter().rev());
                }
                Task::Close(production, arity) => {
                    let children = done.split_off(done.len().saturating_sub(arity));
                    done.push(self.builder.non_terminal(production, children));
                }
            }
        }

        match done.pop() {
            Some(id) => id,
            None => self.builder.non_terminal(Production::Module, Vec::new()),
        }
    }

    fn module<'t>(&self, root: Node<'t>) -> Task<'t> {
        let mut children = statements(&root);
        let end = self.source.lines().count() + 1;
        children.push(Task::Layout(TokenKind::EndMarker, end));
        Task::Build(Production::Module, children)
    }

    fn leaf(&mut self, node: &Node<'_>, scope: Scope) -> NodeId {
        let text = node_text(node, self.source).unwrap_or_default();
        let kind = match classify_leaf(node.kind(), node.is_named(), text) {
            TokenKind::Comma if scope == Scope::Annotation => TokenKind::Operator,
            kind => kind,
        };
        self.builder.token(kind, text, end_line(node))
    }

    fn token(&mut self, node: &Node<'_>, kind: TokenKind) -> NodeId {
        let text = node_text(node, self.source).unwrap_or_default();
        self.builder.token(kind, text, end_line(node))
    }
}

fn statement(node: Node<'_>) -> Task<'_> {
    match node.kind() {
        "function_definition" => Task::Build(Production::FuncDef, children(&node, Scope::Code)),
        "class_definition" => Task::Build(Production::ClassDef, children(&node, Scope::Code)),
        "decorated_definition" => decorated(&node),
        "expression_statement" => expression_statement(&node),
        "import_statement" => import(&node),
        "import_from_statement" => import_from(&node),
        "future_import_statement" => future_import(&node),
        "global_statement" => Task::Build(Production::GlobalStmt, children(&node, Scope::Code)),
        _ => expression(node, Scope::Code),
    }
}

fn expression(node: Node<'_>, scope: Scope) -> Task<'_> {
    match node.kind() {
        "string" => Task::Token(node, TokenKind::String),
        "call" | "attribute" | "subscript" => power(node, scope),
        kind if OPERATOR_CHAINS.contains(&kind) => operator_chain(node, scope),
        _ if node.child_count() == 0 => Task::Leaf(node, scope),
        _ => Task::Build(Production::Other, children(&node, scope)),
    }
}

/// The statements of a module or block, each logical line closed by a `Newline`.
fn statements<'t>(parent: &Node<'t>) -> Vec<Task<'t>> {
    let items = significant_children(parent);
    let mut out = Vec::with_capacity(items.len() * 2);
    for (i, item) in items.iter().enumerate() {
        out.push(Task::Statement(*item));
        if COMPOUND_STATEMENTS.contains(&item.kind()) {
            continue;
        }
        // `a = 1; b = 2` is one logical line
        let continues = items
            .get(i + 1)
            .is_some_and(|next| next.start_position().row == item.end_position().row);
        if !continues {
            out.push(Task::Layout(TokenKind::Newline, end_line(item)));
        }
    }
    out
}

/// Every significant child, with a `block` turned into a suite.
fn children<'t>(node: &Node<'t>, scope: Scope) -> Vec<Task<'t>> {
    let kids = significant_children(node);
    let mut out = Vec::with_capacity(kids.len());
    for (i, kid) in kids.iter().enumerate() {
        if kid.kind() == "block" {
            let header = i
                .checked_sub(1)
                .map_or_else(|| start_line(kid), |prev| end_line(&kids[prev]));
            out.push(suite(kid, header));
        } else {
            out.push(Task::Node(*kid, scope));
        }
    }
    out
}

fn suite<'t>(block: &Node<'t>, header_line: usize) -> Task<'t> {
    let first = significant_children(block).first().map(start_line);
    let children = match first {
        Some(first_line) if first_line > header_line => {
            let mut children = vec![
                Task::Layout(TokenKind::Newline, header_line),
                Task::Layout(TokenKind::Indent, first_line),
            ];
            children.extend(statements(block));
            children.push(Task::Layout(TokenKind::Dedent, end_line(block)));
            children
        }
        _ => statements(block),
    };
    Task::Build(Production::Other, children)
}

fn group<'t>(nodes: &[Node<'t>], scope: Scope) -> Task<'t> {
    if let [only] = nodes {
        return Task::Node(*only, scope);
    }
    Task::Build(
        Production::Other,
        nodes.iter().map(|n| Task::Node(*n, scope)).collect(),
    )
}

/// An assignment target, with any `: T` annotation lowered in annotation scope.
fn target_group<'t>(nodes: &[Node<'t>]) -> Task<'t> {
    let Some(colon) = nodes.iter().position(|n| n.kind() == ":") else {
        return group(nodes, Scope::Code);
    };
    let children = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let scope = if i < colon { Scope::Code } else { Scope::Annotation };
            Task::Node(*n, scope)
        })
        .collect();
    Task::Build(Production::Other, children)
}

fn decorated<'t>(node: &Node<'t>) -> Task<'t> {
    let Some(definition) = node.child_by_field_name("definition") else {
        return Task::Build(Production::Other, children(node, Scope::Code));
    };

    let decorators = significant_children(node)
        .iter()
        .filter(|kid| kid.kind() == "decorator")
        .map(decorator)
        .collect();
    let mut parts = vec![Task::Build(Production::Decorators, decorators)];
    parts.extend(children(&definition, Scope::Code));

    let production = if definition.kind() == "class_definition" {
        Production::ClassDef
    } else {
        Production::FuncDef
    };
    Task::Build(production, parts)
}

fn decorator<'t>(node: &Node<'t>) -> Task<'t> {
    let kids = significant_children(node);
    let mut parts = Vec::with_capacity(kids.len() + 2);
    for kid in &kids {
        if kid.kind() == "@" {
            parts.push(Task::Leaf(*kid, Scope::Code));
        } else {
            parts.extend(decorator_expression(kid));
        }
    }
    let line = kids.last().map_or_else(|| end_line(node), end_line);
    parts.push(Task::Layout(TokenKind::Newline, line));
    Task::Build(Production::Decorator, parts)
}

/// `@a.b` and `@a.b(args)` expose their callee as a dotted name.
fn decorator_expression<'t>(expr: &Node<'t>) -> Vec<Task<'t>> {
    if let Some(chain) = name_chain(expr) {
        return vec![dotted(&chain)];
    }
    if expr.kind() == "call" {
        if let (Some(function), Some(arguments)) = (
            expr.child_by_field_name("function"),
            expr.child_by_field_name("arguments"),
        ) {
            if let Some(chain) = name_chain(&function) {
                return vec![
                    dotted(&chain),
                    Task::Build(Production::Other, children(&arguments, Scope::Code)),
                ];
            }
        }
    }
    vec![Task::Node(*expr, Scope::Code)]
}

fn dotted<'t>(parts: &[Node<'t>]) -> Task<'t> {
    Task::Build(
        Production::DottedName,
        parts.iter().map(|part| Task::Leaf(*part, Scope::Code)).collect(),
    )
}

/// A module path inside an import, or any other child as-is.
fn module_path<'t>(node: &Node<'t>) -> Task<'t> {
    if node.kind() == "dotted_name" {
        dotted(&significant_children(node))
    } else {
        Task::Node(*node, Scope::Code)
    }
}

/// Flatten `f(a).b[c]` into `Power(f, (a), .b, [c])`.
fn power(node: Node<'_>, scope: Scope) -> Task<'_> {
    let mut trailers = Vec::new();
    let mut current = node;
    loop {
        let (primary, trailer) = match current.kind() {
            "call" => {
                let Some(function) = current.child_by_field_name("function") else {
                    break;
                };
                let trailer = current
                    .child_by_field_name("arguments")
                    .map(|args| children(&args, scope))
                    .unwrap_or_default();
                (function, trailer)
            }
            "attribute" | "subscript" => {
                let field = if current.kind() == "attribute" {
                    "object"
                } else {
                    "value"
                };
                let Some(primary) = current.child_by_field_name(field) else {
                    break;
                };
                let trailer = significant_children(&current)
                    .into_iter()
                    .filter(|kid| kid.id() != primary.id())
                    .map(|kid| Task::Node(kid, scope))
                    .collect();
                (primary, trailer)
            }
            _ => break,
        };
        trailers.push(Task::Build(Production::Trailer, trailer));
        current = primary;
    }

    // An unexpanded chain node would come straight back here.
    let head = if current.id() == node.id() {
        Task::Build(Production::Other, children(&current, scope))
    } else {
        Task::Node(current, scope)
    };
    let mut parts = Vec::with_capacity(trailers.len() + 1);
    parts.push(head);
    parts.extend(trailers.into_iter().rev());
    Task::Build(Production::Power, parts)
}

/// Flatten `((a + b) + c) + d` into one group `a + b + c + d`.
fn operator_chain(node: Node<'_>, scope: Scope) -> Task<'_> {
    let kind = node.kind();
    let mut tails = Vec::new();
    let mut current = node;
    while current.kind() == kind {
        let kids = significant_children(&current);
        let Some((left, rest)) = kids.split_first() else {
            break;
        };
        tails.push(rest.to_vec());
        current = *left;
    }

    let head = if current.kind() == kind {
        Task::Leaf(current, scope)
    } else {
        Task::Node(current, scope)
    };
    let mut parts = vec![head];
    for tail in tails.into_iter().rev() {
        parts.extend(tail.into_iter().map(|n| Task::Node(n, scope)));
    }
    Task::Build(Production::Other, parts)
}

fn expression_statement<'t>(node: &Node<'t>) -> Task<'t> {
    let kids = significant_children(node);
    match kids.as_slice() {
        [only] if only.kind() == "assignment" => assignment(only),
        [only] if only.kind() == "augmented_assignment" => augmented_assignment(only),
        [only] => Task::Node(*only, Scope::Code),
        _ => Task::Build(Production::Other, children(node, Scope::Code)),
    }
}

/// `a = b = v` nests to the right in tree-sitter; flatten it to
/// `ExprStmt(a, =, b, =, v)`. An annotation stays inside its target group.
fn assignment<'t>(node: &Node<'t>) -> Task<'t> {
    let mut parts = Vec::new();
    let mut current = *node;
    loop {
        let kids = significant_children(&current);
        let Some(eq) = kids.iter().position(|kid| kid.kind() == "=") else {
            // `x: int` declares without assigning
            let target = target_group(&kids);
            if parts.is_empty() {
                return target;
            }
            parts.push(target);
            break;
        };

        parts.push(target_group(&kids[..eq]));
        parts.push(Task::Token(kids[eq], TokenKind::Equal));
        match &kids[eq + 1..] {
            [next] if next.kind() == "assignment" => current = *next,
            rest => {
                parts.push(group(rest, Scope::Code));
                break;
            }
        }
    }
    Task::Build(Production::ExprStmt, parts)
}

fn augmented_assignment<'t>(node: &Node<'t>) -> Task<'t> {
    let kids = significant_children(node);
    let operator = node.child_by_field_name("operator").map(|op| op.id());
    let Some(at) = kids.iter().position(|kid| Some(kid.id()) == operator) else {
        return Task::Build(Production::Other, children(node, Scope::Code));
    };

    Task::Build(
        Production::ExprStmt,
        vec![
            group(&kids[..at], Scope::Code),
            Task::Token(kids[at], TokenKind::AugAssign),
            group(&kids[at + 1..], Scope::Code),
        ],
    )
}

/// `import a.b as c, d`
fn import<'t>(node: &Node<'t>) -> Task<'t> {
    let mut parts = Vec::with_capacity(2);
    let mut names = Vec::new();
    for kid in significant_children(node) {
        match kid.kind() {
            "import" => parts.push(Task::Leaf(kid, Scope::Code)),
            "dotted_name" => names.push(module_path(&kid)),
            "aliased_import" => names.push(Task::Build(
                Production::Other,
                significant_children(&kid).iter().map(module_path).collect(),
            )),
            _ => names.push(Task::Node(kid, Scope::Code)),
        }
    }
    parts.push(Task::Build(Production::DottedAsNames, names));
    Task::Build(Production::ImportStmt, parts)
}

/// `from ..m import n`: only `m` is a module path.
fn import_from<'t>(node: &Node<'t>) -> Task<'t> {
    let module = node.child_by_field_name("module_name").map(|m| m.id());
    let parts = significant_children(node)
        .into_iter()
        .map(|kid| {
            if Some(kid.id()) != module {
                return Task::Node(kid, Scope::Code);
            }
            match kid.kind() {
                "dotted_name" => module_path(&kid),
                "relative_import" => Task::Build(
                    Production::Other,
                    significant_children(&kid).iter().map(module_path).collect(),
                ),
                _ => Task::Node(kid, Scope::Code),
            }
        })
        .collect();
    Task::Build(Production::ImportStmt, parts)
}

/// `from __future__ import x`: `__future__` is the imported module.
fn future_import<'t>(node: &Node<'t>) -> Task<'t> {
    let parts = significant_children(node)
        .into_iter()
        .map(|kid| {
            if kid.kind() == "__future__" {
                Task::Build(
                    Production::DottedName,
                    vec![Task::Token(kid, TokenKind::Name)],
                )
            } else {
                Task::Node(kid, Scope::Code)
            }
        })
        .collect();
    Task::Build(Production::ImportStmt, parts)
}

/// Identifiers and dots of a pure `a.b.c` attribute chain.
fn name_chain<'t>(node: &Node<'t>) -> Option<Vec<Node<'t>>> {
    let mut tails = Vec::new();
    let mut current = *node;
    while current.kind() == "attribute" {
        let object = current.child_by_field_name("object")?;
        tails.push(
            significant_children(&current)
                .into_iter()
                .filter(|kid| kid.id() != object.id())
                .collect::<Vec<_>>(),
        );
        current = object;
    }
    if current.kind() != "identifier" {
        return None;
    }

    let mut chain = vec![current];
    for tail in tails.into_iter().rev() {
        chain.extend(tail);
    }
    Some(chain)
}

fn classify_leaf(kind: &str, named: bool, text: &str) -> TokenKind {
    if named {
        return match kind {
            "identifier" => TokenKind::Name,
            "true" | "false" | "none" => TokenKind::Keyword,
            "integer" | "float" => TokenKind::Number,
            "string" => TokenKind::String,
            _ => TokenKind::Operator,
        };
    }
    match text {
        "." => TokenKind::Dot,
        "," => TokenKind::Comma,
        "(" => TokenKind::LParen,
        ")" => TokenKind::RParen,
        _ if is_word(text) => TokenKind::Keyword,
        _ => TokenKind::Operator,
    }
}

fn is_word(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::SourceParser;
    use crate::syntax::Node as SyntaxNode;

    fn parse(source: &str) -> SyntaxTree {
        SourceParser::new(&PythonLanguage)
            .expect("grammar loads")
            .parse(source)
            .expect("valid source")
    }

    /// Every terminal in walk order as `(kind, text, line)`.
    fn tokens(tree: &SyntaxTree) -> Vec<(TokenKind, String, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            match tree.node(id) {
                SyntaxNode::Terminal(token) => {
                    out.push((token.kind, token.text.clone(), token.line));
                }
                SyntaxNode::NonTerminal { children, .. } => {
                    stack.extend(children.iter().rev());
                }
            }
        }
        out
    }

    fn kinds(tree: &SyntaxTree) -> Vec<TokenKind> {
        tokens(tree).into_iter().map(|(kind, ..)| kind).collect()
    }

    /// Productions in walk order.
    fn productions(tree: &SyntaxTree) -> Vec<Production> {
        let mut out = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            if let Some(production) = tree.production(id) {
                out.push(production);
            }
            stack.extend(tree.children(id).iter().rev());
        }
        out
    }

    #[test]
    fn simple_statement_ends_with_newline_and_module_with_endmarker() {
        use TokenKind::{EndMarker, Equal, Name, Newline, Number};

        let tree = parse("a = 1\n");

        assert_eq!(kinds(&tree), vec![Name, Equal, Number, Newline, EndMarker]);
        let toks = tokens(&tree);
        assert_eq!(toks[3].2, 1);
        assert_eq!(toks[4].2, 2);
    }

    #[test]
    fn indented_suite_is_bracketed_by_indent_and_dedent() {
        use TokenKind::{
            Dedent, EndMarker, Indent, Keyword, LParen, Name, Newline, Operator, RParen,
        };

        let tree = parse("def f():\n    pass\n");

        assert_eq!(
            kinds(&tree),
            vec![
                Keyword, Name, LParen, RParen, Operator, Newline, Indent, Keyword, Newline,
                Dedent, EndMarker
            ]
        );
        let toks = tokens(&tree);
        assert_eq!(toks[5].2, 1, "newline after the colon stays on the header line");
        assert_eq!(toks[6].2, 2, "indent sits on the first body line");
    }

    #[test]
    fn one_line_suite_has_no_indent() {
        let tree = parse("if x: y = 1\n");
        let kinds = kinds(&tree);

        assert!(!kinds.contains(&TokenKind::Indent));
        assert!(!kinds.contains(&TokenKind::Dedent));
        assert_eq!(
            kinds.iter().filter(|k| **k == TokenKind::Newline).count(),
            1
        );
    }

    #[test]
    fn semicolon_separated_statements_share_one_newline() {
        let tree = parse("a = 1; b = 2\n");

        assert_eq!(
            kinds(&tree)
                .iter()
                .filter(|k| **k == TokenKind::Newline)
                .count(),
            1
        );
    }

    #[test]
    fn comments_are_dropped() {
        let tree = parse("# leading\nx = 1  # trailing\n");

        assert!(tokens(&tree).iter().all(|(_, text, _)| !text.contains('#')));
    }

    #[test]
    fn chained_assignment_flattens() {
        let tree = parse("a = b = 1\n");
        let root_children = tree.children(tree.root());
        let stmt = root_children[0];

        assert_eq!(tree.production(stmt), Some(Production::ExprStmt));
        let equals = tree
            .children(stmt)
            .iter()
            .filter(|c| tree.is_token(**c, TokenKind::Equal))
            .count();
        assert_eq!(equals, 2);
        assert_eq!(tree.children(stmt).len(), 5);
    }

    #[test]
    fn annotated_assignment_groups_target_with_annotation() {
        let tree = parse("x: int = 5\n");
        let stmt = tree.children(tree.root())[0];
        let children = tree.children(stmt);

        assert_eq!(tree.production(stmt), Some(Production::ExprStmt));
        assert_eq!(children.len(), 3);
        assert_eq!(tree.production(children[0]), Some(Production::Other));
        assert!(tree.is_token(children[1], TokenKind::Equal));
    }

    #[test]
    fn augmented_assignment_uses_augassign_token() {
        let tree = parse("n += 1\n");
        let stmt = tree.children(tree.root())[0];
        let children = tree.children(stmt);

        assert_eq!(tree.production(stmt), Some(Production::ExprStmt));
        assert!(tree.is_token(children[1], TokenKind::AugAssign));
    }

    #[test]
    fn annotation_commas_are_operators() {
        let tree = parse("x: Dict[str, int] = {}\n");
        let toks = tokens(&tree);

        assert!(toks.iter().all(|(kind, ..)| *kind != TokenKind::Comma));
        assert!(toks.contains(&(TokenKind::Operator, ",".to_owned(), 1)));
    }

    #[test]
    fn target_tuple_commas_stay_commas() {
        let tree = parse("a, b = 1, 2\n");

        assert_eq!(
            kinds(&tree)
                .iter()
                .filter(|k| **k == TokenKind::Comma)
                .count(),
            2
        );
    }

    #[test]
    fn operator_chain_flattens_into_one_group() {
        let tree = parse("1 + 2 - 3 + 4\n");
        let group = tree.children(tree.root())[0];

        assert_eq!(tree.production(group), Some(Production::Other));
        assert_eq!(tree.children(group).len(), 7);
        assert!(
            tree.children(group)
                .iter()
                .all(|c| tree.production(*c).is_none())
        );
    }

    #[test]
    fn deep_nesting_lowers_without_recursion() {
        let depth = 2_000;
        let source = format!("x = {}0{}\n", "[".repeat(depth), "]".repeat(depth));

        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || parse(&source).len())
            .expect("spawn");

        assert!(handle.join().expect("no stack overflow") > depth * 2);
    }

    #[test]
    fn keyword_argument_equal_is_not_an_assignment_token() {
        let tree = parse("f(k=1)\n");

        assert!(!kinds(&tree).contains(&TokenKind::Equal));
    }

    #[test]
    fn call_chain_flattens_into_power_with_trailers() {
        let tree = parse("a.b(c)[0]\n");
        let power = tree.children(tree.root())[0];
        let children = tree.children(power);

        assert_eq!(tree.production(power), Some(Production::Power));
        assert_eq!(children.len(), 4);
        assert!(tree.is_token(children[0], TokenKind::Name));
        assert!(tree.is_token(tree.children(children[1])[0], TokenKind::Dot));
        assert!(tree.is_token(tree.children(children[2])[0], TokenKind::LParen));
        assert_eq!(
            tree.token(tree.children(children[3])[0]).map(|t| t.text.as_str()),
            Some("[")
        );
    }

    #[test]
    fn import_lowers_module_paths_to_dotted_names() {
        use Production::{DottedAsNames, DottedName, ImportStmt, Module, Other};

        let tree = parse("import os.path as p, sys\n");

        assert_eq!(
            productions(&tree),
            vec![Module, ImportStmt, DottedAsNames, Other, DottedName, DottedName]
        );
    }

    #[test]
    fn from_import_only_marks_the_module_as_dotted() {
        let tree = parse("from a.b import c.d\n");
        let dotted = productions(&tree)
            .into_iter()
            .filter(|p| *p == Production::DottedName)
            .count();

        assert_eq!(dotted, 1);
    }

    #[test]
    fn relative_import_keeps_leading_dots() {
        let tree = parse("from ..pkg import x\n");
        let toks = tokens(&tree);

        assert_eq!(
            toks.iter().filter(|(kind, ..)| *kind == TokenKind::Dot).count(),
            2
        );
        assert!(productions(&tree).contains(&Production::DottedName));
    }

    #[test]
    fn future_import_names_the_future_module() {
        let tree = parse("from __future__ import annotations\n");
        let toks = tokens(&tree);

        assert!(toks.contains(&(TokenKind::Name, "__future__".to_string(), 1)));
        assert!(productions(&tree).contains(&Production::DottedName));
    }

    #[test]
    fn decorated_function_carries_decorators_first() {
        let tree = parse("@app.route('/')\ndef index():\n    pass\n");
        let def = tree.children(tree.root())[0];
        let children = tree.children(def);

        assert_eq!(tree.production(def), Some(Production::FuncDef));
        assert_eq!(tree.production(children[0]), Some(Production::Decorators));
        let decorator = tree.children(children[0])[0];
        let parts = tree.children(decorator);
        assert_eq!(tree.production(decorator), Some(Production::Decorator));
        assert_eq!(tree.production(parts[1]), Some(Production::DottedName));
        assert!(tree.is_token(*parts.last().unwrap(), TokenKind::Newline));
    }

    #[test]
    fn multiline_string_is_one_token_on_its_last_line() {
        let tree = parse("x = \"\"\"a\nb\"\"\"\n");
        let string = tokens(&tree)
            .into_iter()
            .find(|(kind, ..)| *kind == TokenKind::String)
            .unwrap();

        assert_eq!(string.1, "\"\"\"a\nb\"\"\"");
        assert_eq!(string.2, 2);
    }

    #[test]
    fn literals_and_keywords_are_keyword_tokens() {
        let toks = tokens(&parse("x = None if True else not y\n"));
        let keywords: Vec<&str> = toks
            .iter()
            .filter(|(kind, ..)| *kind == TokenKind::Keyword)
            .map(|(_, text, _)| text.as_str())
            .collect();

        assert_eq!(keywords, vec!["None", "if", "True", "else", "not"]);
    }

    #[test]
    fn syntax_error_reports_first_error_position() {
        let result = SourceParser::new(&PythonLanguage)
            .expect("grammar loads")
            .parse("x = 1\ndef (:\n");

        match result {
            Err(SyntaxError::Invalid { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
