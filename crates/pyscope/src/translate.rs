//! Single-pass translation of a syntax tree into cscope record blocks.
//!
//! The walk is depth-first, pre-order, left to right, driven by an explicit
//! stack. Non-terminal rules look ahead into their own children and leave
//! marks for name terminals or open a [`Phase`](crate::context::Phase);
//! terminal rules consume that state, append spans to the current line and
//! commit lines as the line number advances.

use tracing::trace;

use crate::context::Context;
use crate::error::TranslateError;
use crate::syntax::{Node, NodeId, Production, SyntaxTree, Token, TokenKind};
use crate::types::{Mark, NonSymbol, Symbol};

/// Reserved words and literals; a name terminal with this text is plain text.
const RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Translate one file's tree into its rendered record blocks, in line order.
///
/// # Errors
///
/// Returns [`TranslateError`] when the tree has a shape the dispatch rules do
/// not model.
pub fn translate(tree: &SyntaxTree) -> Result<Vec<String>, TranslateError> {
    let mut ctx = Context::new();
    let mut stack = vec![tree.root()];

    while let Some(id) = stack.pop() {
        match tree.node(id) {
            Node::Terminal(token) => terminal(&mut ctx, id, token)?,
            Node::NonTerminal {
                production,
                children,
            } => {
                non_terminal(&mut ctx, tree, id, *production, children)?;
                stack.extend(children.iter().rev());
            }
        }
    }

    if ctx.pending_marks() > 0 {
        trace!(pending = ctx.pending_marks(), "Marks left unconsumed");
    }
    ctx.commit(None);
    Ok(ctx.into_output())
}

// === Non-terminals ===

fn non_terminal(
    ctx: &mut Context,
    tree: &SyntaxTree,
    id: NodeId,
    production: Production,
    children: &[NodeId],
) -> Result<(), TranslateError> {
    match production {
        Production::FuncDef => func_def(ctx, tree, id, children),
        Production::ClassDef => class_def(ctx, tree, id, children),
        Production::GlobalStmt => {
            for &child in children {
                if tree.is_token(child, TokenKind::Name) {
                    ctx.set_mark(tree, child, Mark::OtherGlobal)?;
                }
            }
            Ok(())
        }
        Production::Decorator => {
            ctx.enter_decorator();
            Ok(())
        }
        Production::ImportStmt => {
            ctx.begin_import(count_module_paths(tree, children, false));
            Ok(())
        }
        Production::DottedAsNames => {
            ctx.expect_import_paths(count_module_paths(tree, children, true));
            Ok(())
        }
        Production::DottedName => dotted_name(ctx, tree, id, children),
        Production::ExprStmt => expr_stmt(ctx, tree, id, children),
        Production::Power => power(ctx, tree, children),
        Production::Module | Production::Decorators | Production::Trailer | Production::Other => {
            Ok(())
        }
    }
}

fn shape_error(production: Production, id: NodeId) -> TranslateError {
    TranslateError::UnexpectedShape {
        production: production.as_str(),
        node: id.index(),
    }
}

/// Only the outermost definition is tagged; cscope has no nested scopes.
fn func_def(
    ctx: &mut Context,
    tree: &SyntaxTree,
    id: NodeId,
    children: &[NodeId],
) -> Result<(), TranslateError> {
    if ctx.in_function() {
        trace!(node = id.index(), "Nested function left untagged");
        return Ok(());
    }

    let mut rest = children.iter().copied().skip_while(|&child| {
        tree.production(child) == Some(Production::Decorators) || tree.is_keyword(child, "async")
    });
    if !rest.next().is_some_and(|child| tree.is_keyword(child, "def")) {
        return Err(shape_error(Production::FuncDef, id));
    }
    let name = rest
        .next()
        .ok_or_else(|| shape_error(Production::FuncDef, id))?;
    ctx.set_mark(tree, name, Mark::FuncDef)?;

    // A body on the `def` line has no dedent to close it.
    let indented = children
        .last()
        .and_then(|&suite| tree.children(suite).get(1).copied())
        .is_some_and(|second| tree.is_token(second, TokenKind::Indent));
    if indented {
        ctx.enter_function();
    }
    Ok(())
}

fn class_def(
    ctx: &mut Context,
    tree: &SyntaxTree,
    id: NodeId,
    children: &[NodeId],
) -> Result<(), TranslateError> {
    let name = children
        .iter()
        .position(|&child| tree.is_keyword(child, "class"))
        .and_then(|at| children.get(at + 1).copied())
        .ok_or_else(|| shape_error(Production::ClassDef, id))?;
    ctx.set_mark(tree, name, Mark::Class)
}

fn dotted_name(
    ctx: &mut Context,
    tree: &SyntaxTree,
    id: NodeId,
    children: &[NodeId],
) -> Result<(), TranslateError> {
    if ctx.in_import() {
        let segments = children
            .iter()
            .filter(|&&child| tree.is_token(child, TokenKind::Name))
            .count();
        return ctx.begin_include(id, segments);
    }
    if ctx.in_decorator() {
        // `@a.b.c` calls `c`; the leading segments are only a path to it.
        let last = children
            .last()
            .copied()
            .ok_or_else(|| shape_error(Production::DottedName, id))?;
        ctx.set_mark(tree, last, Mark::FuncCall)?;
        ctx.exit_decorator();
    }
    Ok(())
}

fn expr_stmt(
    ctx: &mut Context,
    tree: &SyntaxTree,
    id: NodeId,
    children: &[NodeId],
) -> Result<(), TranslateError> {
    match children {
        [_, op, _] if tree.is_token(*op, TokenKind::AugAssign) => ctx.begin_compound_assign(),
        [_, eq, ..] if tree.is_token(*eq, TokenKind::Equal) => {
            let equals = children
                .iter()
                .filter(|&&child| tree.is_token(child, TokenKind::Equal))
                .count();
            ctx.begin_assign(equals)
        }
        _ => Err(shape_error(Production::ExprStmt, id)),
    }
}

/// `name(...)` and `....name(...)` pre-mark the callee; both may apply.
fn power(ctx: &mut Context, tree: &SyntaxTree, children: &[NodeId]) -> Result<(), TranslateError> {
    let simple = match children {
        [primary, first, ..]
            if tree.is_token(*primary, TokenKind::Name) && is_call_trailer(tree, *first) =>
        {
            Some(*primary)
        }
        _ => None,
    };
    let member = match children {
        [_, .., member, call] if is_call_trailer(tree, *call) => dot_name_trailer(tree, *member),
        _ => None,
    };
    for callee in simple.into_iter().chain(member) {
        ctx.set_mark(tree, callee, Mark::FuncCall)?;
    }
    Ok(())
}

fn is_call_trailer(tree: &SyntaxTree, id: NodeId) -> bool {
    if tree.production(id) != Some(Production::Trailer) {
        return false;
    }
    let children = tree.children(id);
    matches!(
        (children.first(), children.last()),
        (Some(&open), Some(&close))
            if tree.is_token(open, TokenKind::LParen) && tree.is_token(close, TokenKind::RParen)
    )
}

fn dot_name_trailer(tree: &SyntaxTree, id: NodeId) -> Option<NodeId> {
    if tree.production(id) != Some(Production::Trailer) {
        return None;
    }
    match tree.children(id) {
        [dot, name]
            if tree.is_token(*dot, TokenKind::Dot) && tree.is_token(*name, TokenKind::Name) =>
        {
            Some(*name)
        }
        _ => None,
    }
}

/// Count `DottedName` nodes below `roots`, optionally skipping name lists.
fn count_module_paths(tree: &SyntaxTree, roots: &[NodeId], into_lists: bool) -> usize {
    let mut count = 0;
    let mut stack: Vec<NodeId> = roots.to_vec();
    while let Some(id) = stack.pop() {
        match tree.production(id) {
            Some(Production::DottedName) => count += 1,
            Some(Production::DottedAsNames) if !into_lists => {}
            Some(_) => stack.extend_from_slice(tree.children(id)),
            None => {}
        }
    }
    count
}

// === Terminals ===

fn terminal(ctx: &mut Context, id: NodeId, token: &Token) -> Result<(), TranslateError> {
    // Before any line change: a body can close right at the next statement.
    if token.kind == TokenKind::Dedent {
        if ctx.dedent() {
            ctx.append(Symbol::func_end())?;
        }
        return Ok(());
    }

    // Multi-line strings stay on the line they start on.
    if token.kind != TokenKind::String && ctx.line_number()? != token.line {
        ctx.commit(Some(token.line));
    }

    match token.kind {
        TokenKind::Newline | TokenKind::Dedent => {}
        TokenKind::Indent => ctx.indent(),
        TokenKind::String => ctx.append(NonSymbol::new(token.text.replace('\n', "\\n"))?)?,
        TokenKind::Equal => {
            append_text(ctx, token)?;
            ctx.on_equal()?;
        }
        TokenKind::AugAssign => {
            ctx.on_aug_assign()?;
            append_text(ctx, token)?;
        }
        TokenKind::Comma => {
            append_text(ctx, token)?;
            ctx.on_comma()?;
        }
        TokenKind::Name => name(ctx, id, token)?,
        TokenKind::Dot if ctx.in_include() => {
            ctx.append(Symbol::new(token.text.as_str(), Some(Mark::Include))?)?;
        }
        TokenKind::EndMarker => ctx.commit(None),
        TokenKind::Dot
        | TokenKind::Keyword
        | TokenKind::Number
        | TokenKind::LParen
        | TokenKind::RParen
        | TokenKind::Operator => append_text(ctx, token)?,
    }
    Ok(())
}

fn append_text(ctx: &mut Context, token: &Token) -> Result<(), TranslateError> {
    ctx.append(NonSymbol::new(token.text.as_str())?)
}

fn name(ctx: &mut Context, id: NodeId, token: &Token) -> Result<(), TranslateError> {
    if ctx.in_include() {
        ctx.append(Symbol::new(token.text.as_str(), Some(Mark::Include))?)?;
        ctx.consume_include_segment();
        return Ok(());
    }
    if RESERVED.contains(&token.text.as_str()) {
        return append_text(ctx, token);
    }

    let mark = if ctx.has_mark(id) {
        Some(ctx.take_mark(id)?)
    } else {
        ctx.claim_assign_target()
    };
    if let Some(mark) = mark {
        trace!(name = %token.text, line = token.line, mark = %mark.as_char(), "Tagged name");
    }
    ctx.append(Symbol::new(token.text.as_str(), mark)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::SourceParser;
    use crate::languages::python::PythonLanguage;
    use proptest::prelude::*;
    use rstest::rstest;

    fn run(source: &str) -> Result<Vec<String>, TranslateError> {
        let tree = SourceParser::new(&PythonLanguage)
            .expect("grammar loads")
            .parse(source)
            .expect("valid source");
        translate(&tree)
    }

    fn blocks(source: &str) -> Vec<String> {
        run(source).expect("translates")
    }

    fn joined(source: &str) -> String {
        blocks(source).concat()
    }

    #[rstest]
    #[case::function(
        "def f():\n    pass\n",
        &["1 def \n\t$f\n ( ) :\n\n", "2 pass \n\t}\n\n"]
    )]
    #[case::assignment("a = 1\n", &["1 \n\t=a\n = 1\n\n"])]
    #[case::tuple_assignment("a, b = 1, 2\n", &["1 \n\t=a\n , \n\t=b\n = 1 , 2\n\n"])]
    #[case::chained_assignment("a = b = 1\n", &["1 \n\t=a\n = \n\t=b\n = 1\n\n"])]
    #[case::attribute_target("x.y = 1\n", &["1 \n\t=x\n . \ny\n = 1\n\n"])]
    #[case::annotated_generic(
        "x: Dict[str, int] = {}\n",
        &["1 \n\t=x\n : \nDict\n [ \nstr\n , \nint\n ] = { }\n\n"]
    )]
    #[case::annotated_variadic_tuple(
        "x: Tuple[int, ...] = ()\n",
        &["1 \n\t=x\n : \nTuple\n [ \nint\n , ... ] = ( )\n\n"]
    )]
    #[case::annotated_literal(
        "x: Literal['a', 'b'] = 'a'\n",
        &["1 \n\t=x\n : \nLiteral\n [ 'a' , 'b' ] = 'a'\n\n"]
    )]
    #[case::augmented("n += 1\n", &["1 \n\t=n\n += 1\n\n"])]
    #[case::import("import os.path\n", &["1 import \n\t~os.path\n\n"])]
    #[case::from_import("from a.b import c\n", &["1 from \n\t~a.b\n import \nc\n\n"])]
    #[case::member_call("x.y()\n", &["1 \nx\n . \n\t`y\n ( )\n\n"])]
    #[case::simple_call("len(x)\n", &["1 \n\t`len\n ( \nx\n )\n\n"])]
    #[case::class(
        "class A(B):\n    pass\n",
        &["1 class \n\tcA\n ( \nB\n ) :\n\n"]
    )]
    #[case::string_newlines_escaped(
        "s = \"\"\"a\nb\"\"\"\n",
        &["1 \n\t=s\n = \"\"\"a\\nb\"\"\"\n\n"]
    )]
    #[case::nested_function(
        "def outer():\n    def inner(): pass\n",
        &["1 def \n\t$outer\n ( ) :\n\n", "2 def \ninner\n ( ) : pass \n\t}\n\n"]
    )]
    #[case::decorator(
        "@property\ndef f(self):\n    return 1\n",
        &[
            "1 @ \n\t`property\n\n",
            "2 def \n\t$f\n ( \nself\n ) :\n\n",
            "3 return 1 \n\t}\n\n",
        ]
    )]
    #[case::global(
        "def f():\n    global g\n    g = 1\n",
        &[
            "1 def \n\t$f\n ( ) :\n\n",
            "2 global \n\tgg\n\n",
            "3 \n\t=g\n = 1 \n\t}\n\n",
        ]
    )]
    fn renders_expected_blocks(#[case] source: &str, #[case] expected: &[&str]) {
        assert_eq!(blocks(source), expected);
    }

    #[test]
    fn literals_are_never_tagged() {
        let out = joined("a = 1\n");

        assert!(out.contains("\t=a"));
        assert!(out.contains(" = 1"));
        assert!(!out.contains("\t=1"));
    }

    #[test]
    fn file_without_functions_has_no_func_end() {
        let out = joined("x = 1\nclass C:\n    y = 2\n");

        assert!(!out.contains("\t}"));
    }

    #[test]
    fn one_line_function_is_tagged_but_never_closed() {
        let out = joined("def f(): pass\nclass C:\n    x = 1\n");

        assert!(out.contains("\t$f"));
        assert!(!out.contains("\t}"));
    }

    #[test]
    fn func_end_lands_on_last_body_line() {
        let out = blocks("def f():\n    return 1\nx = 2\n");

        assert_eq!(
            out,
            vec![
                "1 def \n\t$f\n ( ) :\n\n",
                "2 return 1 \n\t}\n\n",
                "3 \n\t=x\n = 2\n\n",
            ]
        );
    }

    #[test]
    fn method_of_a_class_is_outermost_function() {
        let out = joined("class C:\n    def m(self):\n        if self:\n            return 1\n");

        assert!(out.contains("\t$m"));
        assert_eq!(out.matches("\t}").count(), 1);
    }

    #[test]
    fn async_function_is_tagged() {
        let out = joined("async def f():\n    await g()\n");

        assert!(out.contains("\t$f"));
        assert!(out.contains("\t`g"));
    }

    #[test]
    fn decorator_after_import_is_a_call_not_an_include() {
        let out = joined("import os\n@dec\ndef f(): pass\n");

        assert!(out.contains("\t~os"));
        assert!(out.contains("\t`dec"));
        assert!(!out.contains("\t~dec"));
    }

    #[test]
    fn dotted_decorator_marks_only_last_segment() {
        let out = joined("@app.route('/')\ndef index():\n    pass\n");

        assert!(out.contains("1 @ \napp\n . \n\t`route\n ( '/' )\n\n"));
    }

    #[test]
    fn call_and_member_call_in_one_chain() {
        let out = joined("f().g()\n");

        assert!(out.contains("\t`f"));
        assert!(out.contains("\t`g"));
    }

    #[test]
    fn subscript_then_call_is_not_a_call_of_the_name() {
        let out = joined("x[0]()\n");

        assert!(!out.contains('`'));
    }

    #[test]
    fn aliased_import_tags_module_only() {
        let out = joined("import numpy as np\n");

        assert_eq!(out, "1 import \n\t~numpy\n as \nnp\n\n");
    }

    #[test]
    fn continuation_line_commits_previous_line() {
        let out = blocks("x = f(1,\n      y)\n");

        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("1 "));
        assert!(out[1].starts_with("2 "));
    }

    #[test]
    fn keyword_arguments_do_not_close_assignments() {
        let out = joined("d[f(k=1)] = 2\n");

        assert!(out.contains("\t=d"));
        assert!(out.contains("\t`f"));
    }

    #[test]
    fn untaggable_target_is_a_contract_failure() {
        assert_eq!(
            run("f()[0] = 1\n"),
            Err(TranslateError::UnassignedTargets {
                line: 1,
                remaining: 1
            })
        );
    }

    #[test]
    fn long_operator_chain_translates_on_a_small_stack() {
        let source = format!("x = 1{}\n", " + 1".repeat(10_000));

        let out = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || run(&source))
            .expect("spawn")
            .join()
            .expect("no stack overflow")
            .expect("translates");

        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("1 \n\t=x\n = 1 + 1"));
    }

    #[test]
    fn file_of_comments_renders_nothing() {
        assert!(blocks("# nothing here\n\n").is_empty());
    }

    const SNIPPETS: &[&str] = &[
        "a = 1\n",
        "a, b = 1, 2\n",
        "x: Dict[str, int] = {}\n",
        "import os.path\n",
        "from a import b\n",
        "x.y()\n",
        "log('hi')\n",
        "n += 1\n",
        "def f():\n    pass\n",
        "class C:\n    def m(self):\n        return self.v\n",
        "@dec\ndef g():\n    return [i for i in range(3)]\n",
        "if x:\n    y = 2\nelse:\n    y = 3\n",
        "s = '''a\nb'''\n",
        "# comment\n\n",
    ];

    proptest! {
        #[test]
        fn every_block_is_numbered_and_blank_terminated(
            picks in prop::collection::vec(0..SNIPPETS.len(), 0..12)
        ) {
            let source: String = picks.iter().map(|&i| SNIPPETS[i]).collect();
            let out = run(&source).expect("snippets translate");

            for block in out {
                prop_assert!(block.starts_with(|c: char| c.is_ascii_digit()));
                prop_assert!(block.ends_with("\n\n"));
                prop_assert!(!block.ends_with("\n\n\n"));
            }
        }
    }
}
