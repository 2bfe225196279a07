//! Cost-based AND reordering.
//!
//! Every AND subtree is flattened into a list of non-AND operands, stably
//! sorted by a static cost estimate and rebuilt as a right-leaning chain.
//! Because corpus evaluation narrows the candidate set from left to right,
//! cheap metadata filters run before content scans.

use crate::query::ast::Node;

/// Static evaluation cost; lower runs first
pub fn node_cost(node: &Node) -> u32 {
    match node {
        Node::Filter(_) => 10,
        Node::Keyword(_) => 20,
        Node::Phrase(_) => 25,
        Node::Regex(_) | Node::Fuzzy { .. } => 50,
        Node::Or(..) => 100,
        Node::Not(_) => 110,
        Node::And(..) => 1000,
    }
}

/// Plan a parsed tree. Idempotent: planning a planned tree changes nothing.
pub fn plan(node: Node) -> Node {
    match node {
        Node::And(..) => {
            let mut operands = Vec::new();
            flatten_and(node, &mut operands);
            operands.sort_by_key(node_cost);
            rebuild_and(operands)
        }
        Node::Or(left, right) => Node::or(plan(*left), plan(*right)),
        Node::Not(inner) => Node::not(plan(*inner)),
        leaf => leaf,
    }
}

/// Plan an optional tree, passing `None` through
pub fn plan_ast(ast: Option<Node>) -> Option<Node> {
    ast.map(plan)
}

/// Collect non-AND descendants in order, planning Or/Not operands on the way
fn flatten_and(node: Node, out: &mut Vec<Node>) {
    match node {
        Node::And(left, right) => {
            flatten_and(*left, out);
            flatten_and(*right, out);
        }
        other => out.push(plan(other)),
    }
}

fn rebuild_and(operands: Vec<Node>) -> Node {
    let mut iter = operands.into_iter().rev();
    // flatten_and always yields at least two operands for an And
    let Some(mut chain) = iter.next() else {
        unreachable!("AND subtree has no operands");
    };
    for operand in iter {
        chain = Node::and(operand, chain);
    }
    chain
}
