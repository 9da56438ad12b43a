//! Shared tree-sitter utilities for language support modules.
//!
//! Provides common functions for reading text, positions and children from
//! tree-sitter nodes.

use tree_sitter::Node;

/// Node kinds the source grammar discards before any statement sees them.
const TRIVIA: &[&str] = &["comment", "line_continuation"];

/// Get text content of a tree-sitter node.
///
/// Returns `None` if the node's byte range does not fall on character
/// boundaries of `source`.
pub fn node_text<'s>(node: &Node<'_>, source: &'s str) -> Option<&'s str> {
    let text = source.get(node.byte_range());
    if text.is_none() {
        tracing::trace!(
            byte_range = ?node.byte_range(),
            node_kind = %node.kind(),
            "Node range is not a valid text slice"
        );
    }
    text
}

/// 1-indexed line on which the node starts.
pub fn start_line(node: &Node<'_>) -> usize {
    node.start_position().row + 1
}

/// 1-indexed line on which the node ends.
pub fn end_line(node: &Node<'_>) -> usize {
    node.end_position().row + 1
}

/// Children of `node` that carry tokens: no comments, no line continuations,
/// no zero-width nodes.
pub fn significant_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| !TRIVIA.contains(&child.kind()) && child.end_byte() > child.start_byte())
        .collect()
}

/// First `ERROR` or `MISSING` node in pre-order, if any.
pub fn first_error<'t>(root: Node<'t>) -> Option<Node<'t>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
