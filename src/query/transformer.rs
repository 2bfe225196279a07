//! Semantic alias rewriting.
//!
//! Rewrites filters whose values are shorthands into their concrete form,
//! recording a notice for each substitution.

use crate::query::ast::{Filter, FilterOp, Node};

/// Complexity score that `complexity=high` stands for
pub const HIGH_COMPLEXITY_THRESHOLD: u32 = 8;

/// A rewrite returns the replacement filter and a notice describing it
type RewriteRule = fn(&Filter) -> Option<(Filter, String)>;

const REWRITE_RULES: &[RewriteRule] = &[complexity_high];

/// `complexity=high` -> `complexity>=8`
fn complexity_high(filter: &Filter) -> Option<(Filter, String)> {
    let value = filter.value.as_scalar()?;
    if !filter.field.eq_ignore_ascii_case("complexity")
        || filter.op != FilterOp::Eq
        || !value.eq_ignore_ascii_case("high")
    {
        return None;
    }

    let rewritten = Filter::scalar(
        filter.field.clone(),
        FilterOp::Gte,
        HIGH_COMPLEXITY_THRESHOLD.to_string(),
    );
    let notice = format!(
        "'{}={}' was interpreted as 'complexity >= {}'",
        filter.field, value, HIGH_COMPLEXITY_THRESHOLD
    );
    Some((rewritten, notice))
}

/// Apply all rewrite rules throughout the tree
pub fn transform(node: Node, notices: &mut Vec<String>) -> Node {
    match node {
        Node::And(left, right) => Node::and(transform(*left, notices), transform(*right, notices)),
        Node::Or(left, right) => Node::or(transform(*left, notices), transform(*right, notices)),
        Node::Not(inner) => Node::not(transform(*inner, notices)),
        Node::Filter(filter) => {
            for rule in REWRITE_RULES {
                if let Some((rewritten, notice)) = rule(&filter) {
                    notices.push(notice);
                    return Node::Filter(rewritten);
                }
            }
            Node::Filter(filter)
        }
        leaf @ (Node::Keyword(_) | Node::Phrase(_) | Node::Regex(_) | Node::Fuzzy { .. }) => leaf,
    }
}
